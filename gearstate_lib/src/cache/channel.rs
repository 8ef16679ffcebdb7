use std::sync::Arc;

use tracing::trace;
use twilight_model::channel::ChannelType;

use crate::cache::guild::GuildEntry;
use crate::cache::{Cache, Guild};
use crate::model::{ChannelPayload, PermissionOverwrite};
use crate::util::markers::{ChannelId, GuildId, UserId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Channel {
    pub id: ChannelId,
    /// Only set for guild channels
    pub guild_id: Option<GuildId>,
    pub kind: ChannelType,
    pub name: Option<String>,
    pub topic: Option<String>,
    pub position: i32,
    pub nsfw: bool,
    pub permission_overwrites: Vec<PermissionOverwrite>,
    pub parent_id: Option<ChannelId>,
    pub bitrate: u32,
    pub user_limit: u32,
    pub user_rate_limit: u16,
    /// Only set for private channels
    pub recipients: Vec<UserId>,
}

impl Channel {
    /// Guild channels don't always carry the guild id (inside guild create for example), so it
    /// is passed along.
    pub fn from_guild_channel(guild_id: GuildId, channel: ChannelPayload) -> Self {
        Channel {
            id: channel.id,
            guild_id: Some(guild_id),
            kind: channel.kind,
            name: channel.name,
            topic: channel.topic,
            position: channel.position,
            nsfw: channel.nsfw,
            permission_overwrites: channel.permission_overwrites,
            parent_id: channel.parent_id,
            bitrate: channel.bitrate.unwrap_or_default(),
            user_limit: channel.user_limit.unwrap_or_default(),
            user_rate_limit: channel.rate_limit_per_user.unwrap_or_default(),
            recipients: Vec::new(),
        }
    }

    pub fn from_private_channel(channel: ChannelPayload) -> Self {
        Channel {
            id: channel.id,
            guild_id: None,
            kind: channel.kind,
            name: channel.name,
            topic: None,
            position: 0,
            nsfw: false,
            permission_overwrites: Vec::new(),
            parent_id: None,
            bitrate: 0,
            user_limit: 0,
            user_rate_limit: 0,
            recipients: channel.recipients.into_iter().map(|user| user.id).collect(),
        }
    }

    pub fn is_private(&self) -> bool {
        self.guild_id.is_none()
    }
}

impl Cache {
    /// Look up any channel, guild or private
    pub fn get_channel(&self, channel_id: &ChannelId) -> Option<Arc<Channel>> {
        if let Some(channel) = self.get_guild_channel(channel_id) {
            return Some(channel);
        }
        self.get_private_channel(channel_id)
    }

    pub fn get_guild_channel(&self, channel_id: &ChannelId) -> Option<Arc<Channel>> {
        self.guild_channels.read().get(channel_id).cloned()
    }

    pub fn get_private_channel(&self, channel_id: &ChannelId) -> Option<Arc<Channel>> {
        self.private_channels.read().get(channel_id).cloned()
    }

    pub fn get_private_channels(&self) -> Vec<Arc<Channel>> {
        self.private_channels.read().values().cloned().collect()
    }

    pub fn get_guild_channels(&self, guild_id: &GuildId) -> Vec<Arc<Channel>> {
        self.get_guild(guild_id).map(|guild| guild.channels()).unwrap_or_default()
    }

    /// The guild a channel belongs to
    pub fn get_channel_guild(&self, channel_id: &ChannelId) -> Option<Arc<Guild>> {
        // release the index before touching the guild map
        let guild_id = self.guild_channels.read().get(channel_id).and_then(|channel| channel.guild_id)?;
        self.get_guild(&guild_id)
    }

    /// Insert or replace a channel of a guild. A channel lives in exactly one place so it is
    /// pulled out of wherever it was before.
    pub(crate) fn insert_guild_channel(&self, guild: &Guild, channel: Arc<Channel>) -> Option<Arc<Channel>> {
        trace!("Inserting channel {} into guild {}", channel.id, guild.id);
        let guilds = self.guilds.read();
        let mut index = self.guild_channels.write();
        let mut private = self.private_channels.write();

        let old_private = private.remove(&channel.id);
        let old = index.insert(channel.id, channel.clone());
        let previous_owner = old
            .as_ref()
            .and_then(|old| old.guild_id)
            .filter(|owner| *owner != guild.id)
            .and_then(|owner| guilds.get(&owner))
            .and_then(GuildEntry::available);
        if let Some(owner) = previous_owner {
            owner.channels_mut().remove(&channel.id);
        }
        guild.channels_mut().insert(channel.id, channel);

        old.or(old_private)
    }

    pub(crate) fn insert_private_channel(&self, channel: Arc<Channel>) -> Option<Arc<Channel>> {
        trace!("Inserting private channel {}", channel.id);
        let guilds = self.guilds.read();
        let mut index = self.guild_channels.write();
        let mut private = self.private_channels.write();

        let old_guild_channel = index.remove(&channel.id);
        let owner = old_guild_channel
            .as_ref()
            .and_then(|old| old.guild_id)
            .and_then(|owner| guilds.get(&owner))
            .and_then(GuildEntry::available);
        if let Some(owner) = owner {
            owner.channels_mut().remove(&channel.id);
        }

        private.insert(channel.id, channel).or(old_guild_channel)
    }

    /// Remove a channel from wherever it is cached
    pub(crate) fn remove_channel(&self, channel_id: &ChannelId) -> Option<Arc<Channel>> {
        let guilds = self.guilds.read();
        let mut index = self.guild_channels.write();
        let mut private = self.private_channels.write();

        if let Some(channel) = index.remove(channel_id) {
            let owner = channel
                .guild_id
                .and_then(|owner| guilds.get(&owner))
                .and_then(GuildEntry::available);
            if let Some(owner) = owner {
                owner.channels_mut().remove(channel_id);
            }
            return Some(channel);
        }

        private.remove(channel_id)
    }
}
