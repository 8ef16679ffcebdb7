use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};
use twilight_model::guild::{MfaLevel, VerificationLevel};

use crate::cache::{Cache, Channel, Emoji, Member, Presence, Role, VoiceState};
use crate::model::{
    ChannelPayload, EmojiPayload, GuildPayload, MemberPayload, PartialGuildPayload, PresencePayload, RolePayload,
    VoiceStatePayload,
};
use crate::util::markers::{ChannelId, EmojiId, GuildId, RoleId, UserId};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum GuildCacheState {
    Created,
    ReceivingMembers,
    Cached,
    Unavailable,
}

impl GuildCacheState {
    pub fn name(&self) -> &'static str {
        match self {
            GuildCacheState::Created => "Created",
            GuildCacheState::ReceivingMembers => "Receiving members",
            GuildCacheState::Cached => "Cached",
            GuildCacheState::Unavailable => "Unavailable",
        }
    }
}

/// What the guild map holds for a guild id. Unavailable guilds keep their slot so they can come
/// back later, but nothing about them is readable.
#[derive(Clone)]
pub enum GuildEntry {
    Available(Arc<Guild>),
    Unavailable,
}

impl GuildEntry {
    pub fn available(&self) -> Option<&Arc<Guild>> {
        match self {
            GuildEntry::Available(guild) => Some(guild),
            GuildEntry::Unavailable => None,
        }
    }
}

/// The plain attributes of a guild, replaced as a whole on every update
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuildInfo {
    pub name: String,
    pub icon: Option<String>,
    pub splash: Option<String>,
    pub banner: Option<String>,
    pub owner_id: UserId,
    pub region: Option<String>,
    pub verification_level: VerificationLevel,
    pub mfa_level: MfaLevel,
    pub features: Vec<String>,
    pub description: Option<String>,
    pub vanity_invite: Option<String>,
    pub preferred_locale: Option<String>,
    pub max_members: Option<u64>,
}

impl GuildInfo {
    fn from_payload(guild: &PartialGuildPayload) -> Self {
        GuildInfo {
            name: guild.name.clone(),
            icon: guild.icon.clone(),
            splash: guild.splash.clone(),
            banner: guild.banner.clone(),
            owner_id: guild.owner_id,
            region: guild.region.clone(),
            verification_level: guild.verification_level,
            mfa_level: guild.mfa_level,
            features: guild.features.clone(),
            description: guild.description.clone(),
            vanity_invite: guild.vanity_url_code.clone(),
            preferred_locale: guild.preferred_locale.clone(),
            max_members: guild.max_members,
        }
    }
}

/// A cached guild. Every group of data has its own lock so readers of one never wait on writes
/// to another. Only the event applier mutates a guild, readers get `Arc`s of immutable values.
pub struct Guild {
    pub id: GuildId,
    info: RwLock<Arc<GuildInfo>>,
    roles: RwLock<HashMap<RoleId, Arc<Role>>>,
    emojis: RwLock<Vec<Arc<Emoji>>>,
    channels: RwLock<HashMap<ChannelId, Arc<Channel>>>,
    // members we know about, this is not guaranteed to be complete
    members: RwLock<HashMap<UserId, Arc<Member>>>,
    // what the api says the member count is
    member_count: AtomicU64,
    voice_states: RwLock<HashMap<UserId, Arc<VoiceState>>>,
    presences: RwLock<HashMap<UserId, Arc<Presence>>>,

    cache_state: RwLock<GuildCacheState>,
}

impl Guild {
    pub(crate) fn from_payload(guild: GuildPayload) -> Self {
        let member_count = guild.member_count.unwrap_or(guild.members.len() as u64);
        Guild {
            id: guild.guild.id,
            info: RwLock::new(Arc::new(GuildInfo::from_payload(&guild.guild))),
            roles: RwLock::new(convert_roles(guild.guild.roles)),
            emojis: RwLock::new(convert_emoji(guild.guild.emojis)),
            channels: RwLock::new(convert_channels(guild.guild.id, guild.channels)),
            members: RwLock::new(convert_members(guild.members)),
            member_count: AtomicU64::new(member_count),
            voice_states: RwLock::new(convert_voice_states(guild.voice_states)),
            presences: RwLock::new(convert_presences(guild.presences)),
            cache_state: RwLock::new(GuildCacheState::Created),
        }
    }

    pub fn info(&self) -> Arc<GuildInfo> {
        self.info.read().clone()
    }

    pub fn name(&self) -> String {
        self.info.read().name.clone()
    }

    pub fn owner_id(&self) -> UserId {
        self.info.read().owner_id
    }

    pub fn cache_state(&self) -> GuildCacheState {
        *self.cache_state.read()
    }

    /// Member count as reported by the api, can be higher than the amount of cached members
    pub fn member_count(&self) -> u64 {
        self.member_count.load(Ordering::SeqCst)
    }

    pub fn role(&self, role_id: &RoleId) -> Option<Arc<Role>> {
        self.roles.read().get(role_id).cloned()
    }

    /// All roles, sorted the way they show up in the client
    pub fn roles(&self) -> Vec<Arc<Role>> {
        let mut roles: Vec<Arc<Role>> = self.roles.read().values().cloned().collect();
        roles.sort_by(|a, b| b.position.cmp(&a.position).then(a.id.cmp(&b.id)));
        roles
    }

    pub fn emoji(&self, emoji_id: &EmojiId) -> Option<Arc<Emoji>> {
        self.emojis.read().iter().find(|emoji| emoji.id == *emoji_id).cloned()
    }

    pub fn emojis(&self) -> Vec<Arc<Emoji>> {
        self.emojis.read().clone()
    }

    pub fn channel(&self, channel_id: &ChannelId) -> Option<Arc<Channel>> {
        self.channels.read().get(channel_id).cloned()
    }

    pub fn channels(&self) -> Vec<Arc<Channel>> {
        let mut channels: Vec<Arc<Channel>> = self.channels.read().values().cloned().collect();
        channels.sort_by(|a, b| a.position.cmp(&b.position).then(a.id.cmp(&b.id)));
        channels
    }

    pub fn get_member(&self, user_id: &UserId) -> Option<Arc<Member>> {
        self.members.read().get(user_id).cloned()
    }

    pub fn members(&self) -> Vec<Arc<Member>> {
        self.members.read().values().cloned().collect()
    }

    pub fn cached_member_count(&self) -> usize {
        self.members.read().len()
    }

    pub fn voice_state(&self, user_id: &UserId) -> Option<Arc<VoiceState>> {
        self.voice_states.read().get(user_id).cloned()
    }

    pub fn voice_states(&self) -> Vec<Arc<VoiceState>> {
        self.voice_states.read().values().cloned().collect()
    }

    pub fn presence(&self, user_id: &UserId) -> Option<Arc<Presence>> {
        self.presences.read().get(user_id).cloned()
    }

    pub fn presences(&self) -> Vec<Arc<Presence>> {
        self.presences.read().values().cloned().collect()
    }

    // --- mutations, only the event applier gets to call these ---

    /// Merge an update into this guild: attributes are overwritten, roles and emoji replaced
    pub(crate) fn update(&self, guild: PartialGuildPayload) {
        *self.info.write() = Arc::new(GuildInfo::from_payload(&guild));
        *self.roles.write() = convert_roles(guild.roles);
        *self.emojis.write() = convert_emoji(guild.emojis);
    }

    /// Replace everything but the channels with a fresh full payload. Channels go through the
    /// cache since the flattened channel index has to follow along.
    pub(crate) fn refresh(&self, guild: GuildPayload) -> Vec<ChannelPayload> {
        if let Some(count) = guild.member_count {
            self.member_count.store(count, Ordering::SeqCst);
        }
        *self.members.write() = convert_members(guild.members);
        *self.voice_states.write() = convert_voice_states(guild.voice_states);
        *self.presences.write() = convert_presences(guild.presences);
        self.update(guild.guild);
        guild.channels
    }

    pub(crate) fn insert_role(&self, role: Arc<Role>) -> Option<Arc<Role>> {
        self.roles.write().insert(role.id, role)
    }

    pub(crate) fn remove_role(&self, role_id: &RoleId) -> Option<Arc<Role>> {
        self.roles.write().remove(role_id)
    }

    pub(crate) fn update_emoji(&self, emoji: Vec<EmojiPayload>) {
        *self.emojis.write() = convert_emoji(emoji)
    }

    /// Bulk receiving members from member chunks, returns how many of them were new
    pub(crate) fn receive_members(&self, members: impl Iterator<Item = (UserId, Arc<Member>)>, last: bool) -> u64 {
        let mut stored_members = self.members.write();
        let mut inserted = 0;
        for (user_id, member) in members {
            if stored_members.insert(user_id, member).is_none() {
                inserted += 1;
            }
        }
        drop(stored_members);

        let new_state = if last {
            GuildCacheState::Cached
        } else {
            GuildCacheState::ReceivingMembers
        };
        let mut state = self.cache_state.write();
        if *state != new_state {
            debug!("Guild {} cache state: {} => {}", self.id, state.name(), new_state.name());
            *state = new_state;
        }

        inserted
    }

    /// A member joined: bump the count and store them
    pub(crate) fn add_member(&self, user_id: UserId, member: Arc<Member>) -> Option<Arc<Member>> {
        self.member_count.fetch_add(1, Ordering::SeqCst);
        self.insert_member(user_id, member)
    }

    pub(crate) fn insert_member(&self, user_id: UserId, member: Arc<Member>) -> Option<Arc<Member>> {
        // DO NOT touch the member count here, this is also used for updates
        self.members.write().insert(user_id, member)
    }

    /// A member left. The count follows the api even when we never had the member cached.
    pub(crate) fn remove_member(&self, user_id: &UserId) -> Option<Arc<Member>> {
        let _ = self
            .member_count
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| Some(count.saturating_sub(1)));
        let old = self.members.write().remove(user_id);
        // they're gone, so is their presence and voice state
        self.presences.write().remove(user_id);
        self.voice_states.write().remove(user_id);
        old
    }

    pub(crate) fn set_voice_state(&self, user_id: UserId, state: Option<Arc<VoiceState>>) -> Option<Arc<VoiceState>> {
        let mut states = self.voice_states.write();
        if let Some(state) = state {
            states.insert(user_id, state)
        } else {
            states.remove(&user_id)
        }
    }

    pub(crate) fn set_presence(&self, user_id: UserId, presence: Option<Arc<Presence>>) -> Option<Arc<Presence>> {
        let mut presences = self.presences.write();
        if let Some(presence) = presence {
            presences.insert(user_id, presence)
        } else {
            presences.remove(&user_id)
        }
    }

    // channel map access for the cache, which holds the index locks while calling these
    pub(crate) fn channels_mut(&self) -> parking_lot::RwLockWriteGuard<'_, HashMap<ChannelId, Arc<Channel>>> {
        self.channels.write()
    }
}

fn convert_emoji(raw_emoji: Vec<EmojiPayload>) -> Vec<Arc<Emoji>> {
    raw_emoji.into_iter().map(|emoji| Arc::new(Emoji::from_emoji(emoji))).collect()
}

fn convert_roles(raw_roles: Vec<RolePayload>) -> HashMap<RoleId, Arc<Role>> {
    let mut roles = HashMap::with_capacity(raw_roles.len());
    for role in raw_roles {
        roles.insert(role.id, Arc::new(Role::from_role(role)));
    }
    roles
}

fn convert_channels(guild_id: GuildId, raw_channels: Vec<ChannelPayload>) -> HashMap<ChannelId, Arc<Channel>> {
    let mut channels = HashMap::with_capacity(raw_channels.len());
    for channel in raw_channels {
        channels.insert(channel.id, Arc::new(Channel::from_guild_channel(guild_id, channel)));
    }
    channels
}

fn convert_members(raw_members: Vec<MemberPayload>) -> HashMap<UserId, Arc<Member>> {
    let mut members = HashMap::with_capacity(raw_members.len());
    for member in raw_members {
        members.insert(member.user.id, Arc::new(Member::from_member(member)));
    }
    members
}

fn convert_voice_states(raw_states: Vec<VoiceStatePayload>) -> HashMap<UserId, Arc<VoiceState>> {
    let mut voice_states = HashMap::with_capacity(raw_states.len());
    for state in raw_states {
        let uid = state.user_id;
        if let Some(s) = VoiceState::from_state(state) {
            voice_states.insert(uid, Arc::new(s));
        }
    }
    voice_states
}

fn convert_presences(raw_presences: Vec<PresencePayload>) -> HashMap<UserId, Arc<Presence>> {
    let mut presences = HashMap::with_capacity(raw_presences.len());
    for presence in raw_presences {
        let uid = presence.user.id;
        if let Some(p) = Presence::from_presence(presence) {
            presences.insert(uid, Arc::new(p));
        }
    }
    presences
}

impl Cache {
    pub fn get_guild(&self, guild_id: &GuildId) -> Option<Arc<Guild>> {
        self.guilds.read().get(guild_id).and_then(|entry| entry.available().cloned())
    }

    /// Every available guild
    pub fn guilds(&self) -> Vec<Arc<Guild>> {
        self.guilds
            .read()
            .values()
            .filter_map(|entry| entry.available().cloned())
            .collect()
    }

    pub fn guild_ids(&self) -> Vec<GuildId> {
        self.guilds
            .read()
            .iter()
            .filter(|(_, entry)| entry.available().is_some())
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn unavailable_guilds(&self) -> Vec<GuildId> {
        self.guilds
            .read()
            .iter()
            .filter(|(_, entry)| entry.available().is_none())
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn is_unavailable(&self, guild_id: &GuildId) -> bool {
        matches!(self.guilds.read().get(guild_id), Some(GuildEntry::Unavailable))
    }

    pub(crate) fn guild_entry(&self, guild_id: &GuildId) -> Option<GuildEntry> {
        self.guilds.read().get(guild_id).cloned()
    }

    /// Store a fully received guild, replacing whatever the slot held before (nothing, a
    /// tombstone or an older copy). Returns the previous copy if there was one.
    pub(crate) fn insert_guild(&self, guild: Arc<Guild>) -> Option<Arc<Guild>> {
        trace!("Inserting guild {} into the cache", guild.id);
        let mut guilds = self.guilds.write();
        let mut index = self.guild_channels.write();

        let old = guilds.insert(guild.id, GuildEntry::Available(guild.clone()));
        let old = old.and_then(|entry| entry.available().cloned());
        if let Some(old_guild) = &old {
            for channel_id in old_guild.channels_mut().keys() {
                index.remove(channel_id);
            }
        }
        for (channel_id, channel) in guild.channels_mut().iter() {
            index.insert(*channel_id, channel.clone());
        }

        old
    }

    /// Swap out the channels of a guild, keeping the flattened index in sync
    pub(crate) fn replace_guild_channels(&self, guild: &Guild, channels: Vec<ChannelPayload>) {
        let mut index = self.guild_channels.write();
        let mut guild_channels = guild.channels_mut();

        for channel_id in guild_channels.keys() {
            index.remove(channel_id);
        }
        *guild_channels = convert_channels(guild.id, channels);
        for (channel_id, channel) in guild_channels.iter() {
            index.insert(*channel_id, channel.clone());
        }
    }

    /// Turn the guild into a tombstone, its channels leave the index. Returns the old copy.
    pub(crate) fn mark_guild_unavailable(&self, guild_id: GuildId) -> Option<GuildEntry> {
        let mut guilds = self.guilds.write();
        let mut index = self.guild_channels.write();

        let old = guilds.insert(guild_id, GuildEntry::Unavailable);
        if let Some(GuildEntry::Available(old_guild)) = &old {
            for channel_id in old_guild.channels_mut().keys() {
                index.remove(channel_id);
            }
        }
        old
    }

    /// Drop a guild and all of its channels
    pub(crate) fn remove_guild(&self, guild_id: &GuildId) -> Option<GuildEntry> {
        let mut guilds = self.guilds.write();
        let mut index = self.guild_channels.write();

        let old = guilds.remove(guild_id);
        if let Some(GuildEntry::Available(old_guild)) = &old {
            let removed = old_guild.channels_mut().keys().filter(|id| index.remove(id).is_some()).count();
            debug!("Removed guild {} and {} of its channels", guild_id, removed);
        }
        old
    }
}
