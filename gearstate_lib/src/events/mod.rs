use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::cache::Cache;
use crate::model::{
    ChannelPayload, CurrentUserPayload, GuildDelete, GuildEmojisUpdate, GuildPayload, MemberAdd, MemberChunk,
    MemberRemove, MemberUpdate, PartialGuildPayload, PresencePayload, Ready, RoleDelete, RoleUpsert,
    VoiceStatePayload,
};
use crate::util::markers::{ChannelId, GuildId, UserId};
use crate::util::metrics::Metrics;

use crate::events::channel::{on_channel_create, on_channel_delete, on_channel_update};
use crate::events::emoji::on_emoji_update;
use crate::events::guild::{on_guild_create, on_guild_delete, on_guild_update, on_member_chunk};
use crate::events::member::{on_member_add, on_member_remove, on_member_update};
use crate::events::other::{on_ready, on_user_update};
use crate::events::presence::on_presence_update;
use crate::events::role::{on_role_create, on_role_delete, on_role_update};
use crate::events::voice::on_voice_state_update;

mod channel;
mod emoji;
mod guild;
mod member;
mod other;
mod presence;
mod role;
mod voice;

/// A gateway dispatch, as `{"t": "KIND", "d": payload}`
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "t", content = "d", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    Ready(Box<Ready>),
    ChannelCreate(ChannelPayload),
    ChannelUpdate(ChannelPayload),
    ChannelDelete(ChannelPayload),
    GuildCreate(Box<GuildPayload>),
    GuildUpdate(Box<PartialGuildPayload>),
    GuildDelete(GuildDelete),
    GuildEmojisUpdate(GuildEmojisUpdate),
    GuildMemberAdd(Box<MemberAdd>),
    GuildMemberRemove(MemberRemove),
    GuildMemberUpdate(Box<MemberUpdate>),
    GuildMembersChunk(MemberChunk),
    GuildRoleCreate(RoleUpsert),
    GuildRoleUpdate(RoleUpsert),
    GuildRoleDelete(RoleDelete),
    PresenceUpdate(Box<PresencePayload>),
    UserUpdate(CurrentUserPayload),
    VoiceStateUpdate(Box<VoiceStatePayload>),
}

impl Event {
    /// Name of the event as the gateway sends it
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Ready(_) => "READY",
            Event::ChannelCreate(_) => "CHANNEL_CREATE",
            Event::ChannelUpdate(_) => "CHANNEL_UPDATE",
            Event::ChannelDelete(_) => "CHANNEL_DELETE",
            Event::GuildCreate(_) => "GUILD_CREATE",
            Event::GuildUpdate(_) => "GUILD_UPDATE",
            Event::GuildDelete(_) => "GUILD_DELETE",
            Event::GuildEmojisUpdate(_) => "GUILD_EMOJIS_UPDATE",
            Event::GuildMemberAdd(_) => "GUILD_MEMBER_ADD",
            Event::GuildMemberRemove(_) => "GUILD_MEMBER_REMOVE",
            Event::GuildMemberUpdate(_) => "GUILD_MEMBER_UPDATE",
            Event::GuildMembersChunk(_) => "GUILD_MEMBERS_CHUNK",
            Event::GuildRoleCreate(_) => "GUILD_ROLE_CREATE",
            Event::GuildRoleUpdate(_) => "GUILD_ROLE_UPDATE",
            Event::GuildRoleDelete(_) => "GUILD_ROLE_DELETE",
            Event::PresenceUpdate(_) => "PRESENCE_UPDATE",
            Event::UserUpdate(_) => "USER_UPDATE",
            Event::VoiceStateUpdate(_) => "VOICE_STATE_UPDATE",
        }
    }
}

/// What applying an event did to the cache
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The cache changed and downstream consumers should hear about it
    Changed,
    /// The event was absorbed without anything worth passing on, like a guild coming back
    /// from an outage or an update that didn't change anything
    Suppressed,
    /// The event didn't fit the cache and was dropped (or, for a duplicate guild, merged)
    Condition(Condition),
}

impl ApplyOutcome {
    pub fn condition(&self) -> Option<&Condition> {
        match self {
            ApplyOutcome::Condition(condition) => Some(condition),
            _ => None,
        }
    }
}

/// Events referring to things the cache doesn't know about. These are expected every now and
/// then and never fatal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    UnknownGuild(GuildId),
    UnknownMember { guild_id: GuildId, user_id: UserId },
    UnknownChannel(ChannelId),
    GuildAlreadyExists(GuildId),
}

impl Condition {
    /// Metrics label
    pub fn name(&self) -> &'static str {
        match self {
            Condition::UnknownGuild(_) => "unknown_guild",
            Condition::UnknownMember { .. } => "unknown_member",
            Condition::UnknownChannel(_) => "unknown_channel",
            Condition::GuildAlreadyExists(_) => "guild_already_exists",
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Condition::UnknownGuild(guild_id) => write!(f, "guild {} is not cached", guild_id),
            Condition::UnknownMember { guild_id, user_id } => {
                write!(f, "member {} is not cached in guild {}", user_id, guild_id)
            }
            Condition::UnknownChannel(channel_id) => write!(f, "channel {} is not cached", channel_id),
            Condition::GuildAlreadyExists(guild_id) => write!(f, "guild {} was already cached", guild_id),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApplierState {
    /// No snapshot received yet
    Uninitialized,
    Ready,
}

/// The only thing allowed to write to the cache. Taking `&mut self` keeps it to one event at a
/// time, readers are free to use the cache while this runs.
pub struct EventApplier {
    cache: Arc<Cache>,
    state: ApplierState,
    metrics: Option<Arc<Metrics>>,
}

impl EventApplier {
    pub fn new(cache: Arc<Cache>) -> Self {
        EventApplier {
            cache,
            state: ApplierState::Uninitialized,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn cache(&self) -> &Arc<Cache> {
        &self.cache
    }

    pub fn state(&self) -> ApplierState {
        self.state
    }

    pub fn apply(&mut self, event: Event) -> ApplyOutcome {
        let kind = event.kind();
        trace!("Applying {}", kind);
        if let Some(metrics) = &self.metrics {
            metrics.gateway_events.with_label_values(&[kind]).inc();
        }

        let cache = &self.cache;

        //Just a hub to fan out to the relevant handlers
        let outcome = match event {
            Event::Ready(snapshot) => {
                let outcome = on_ready(*snapshot, cache);
                self.state = ApplierState::Ready;
                outcome
            }
            Event::ChannelCreate(channel) => on_channel_create(channel, cache),
            Event::ChannelUpdate(channel) => on_channel_update(channel, cache),
            Event::ChannelDelete(channel) => on_channel_delete(channel, cache),
            Event::GuildCreate(guild) => on_guild_create(*guild, cache),
            Event::GuildUpdate(guild) => on_guild_update(*guild, cache),
            Event::GuildDelete(delete) => on_guild_delete(delete, cache),
            Event::GuildEmojisUpdate(update) => on_emoji_update(update, cache),
            Event::GuildMemberAdd(add) => on_member_add(*add, cache),
            Event::GuildMemberRemove(remove) => on_member_remove(remove, cache),
            Event::GuildMemberUpdate(update) => on_member_update(*update, cache),
            Event::GuildMembersChunk(chunk) => on_member_chunk(chunk, cache),
            Event::GuildRoleCreate(create) => on_role_create(create, cache),
            Event::GuildRoleUpdate(update) => on_role_update(update, cache),
            Event::GuildRoleDelete(delete) => on_role_delete(delete, cache),
            Event::PresenceUpdate(presence) => on_presence_update(*presence, cache),
            Event::UserUpdate(user) => on_user_update(user, cache),
            Event::VoiceStateUpdate(state) => on_voice_state_update(*state, cache),
        };

        match &outcome {
            ApplyOutcome::Condition(condition) => {
                warn!("Unexpected {} event: {}", kind, condition);
                if let Some(metrics) = &self.metrics {
                    metrics.event_conditions.with_label_values(&[condition.name()]).inc();
                }
            }
            ApplyOutcome::Suppressed => debug!("{} suppressed", kind),
            ApplyOutcome::Changed => {}
        }

        outcome
    }
}
