use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::info;

use crate::util::markers::{ChannelId, GuildId};

pub mod channel;
pub mod emoji;
pub mod guild;
pub mod member;
pub mod permissions;
pub mod presence;
pub mod role;
pub mod user;
pub mod voice_state;

pub use channel::Channel;
pub use emoji::Emoji;
pub use guild::{Guild, GuildCacheState, GuildEntry, GuildInfo};
pub use member::Member;
pub use presence::Presence;
pub use role::Role;
pub use user::{CurrentUser, User};
pub use voice_state::VoiceState;

/// In memory view of everything the gateway told us.
///
/// Reads can happen from any thread at any time, writes only come from the event applier.
/// Whenever more than one lock is held they are taken in this order:
/// `guilds` -> `guild_channels` -> `private_channels` -> locks inside a [`Guild`].
/// `current_user` is never held together with anything else.
pub struct Cache {
    guilds: RwLock<HashMap<GuildId, GuildEntry>>,
    // flattened index of the channels of all available guilds
    guild_channels: RwLock<HashMap<ChannelId, Arc<Channel>>>,
    private_channels: RwLock<HashMap<ChannelId, Arc<Channel>>>,
    current_user: RwLock<Option<Arc<CurrentUser>>>,
}

/// Counts for the metrics, taken in a single pass over the cache
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub guilds: Vec<(GuildCacheState, usize)>,
    pub guild_channels: usize,
    pub private_channels: usize,
    pub members: usize,
}

impl Cache {
    pub fn new() -> Self {
        Cache {
            guilds: Default::default(),
            guild_channels: Default::default(),
            private_channels: Default::default(),
            current_user: Default::default(),
        }
    }

    /// Throw everything away and start over from a fresh snapshot. Every guild in it starts out
    /// unavailable until its full data comes in.
    pub(crate) fn reset(
        &self,
        user: Arc<CurrentUser>,
        guilds: impl IntoIterator<Item = GuildId>,
        private_channels: Vec<Arc<Channel>>,
    ) {
        {
            let mut cached_guilds = self.guilds.write();
            let mut index = self.guild_channels.write();
            let mut private = self.private_channels.write();

            cached_guilds.clear();
            index.clear();
            private.clear();

            for guild_id in guilds {
                cached_guilds.insert(guild_id, GuildEntry::Unavailable);
            }
            for channel in private_channels {
                private.insert(channel.id, channel);
            }
            info!(
                "Cache reset: {} guilds pending, {} private channels",
                cached_guilds.len(),
                private.len()
            );
        }

        self.set_current_user(user);
    }

    pub fn stats(&self) -> CacheStats {
        let mut per_state: HashMap<GuildCacheState, usize> = HashMap::new();
        let mut members = 0;
        {
            let guilds = self.guilds.read();
            for entry in guilds.values() {
                let state = match entry {
                    GuildEntry::Available(guild) => {
                        members += guild.cached_member_count();
                        guild.cache_state()
                    }
                    GuildEntry::Unavailable => GuildCacheState::Unavailable,
                };
                *per_state.entry(state).or_default() += 1;
            }
        }

        // report every state, also the empty ones, so gauges drop back to 0
        let guilds = [
            GuildCacheState::Created,
            GuildCacheState::ReceivingMembers,
            GuildCacheState::Cached,
            GuildCacheState::Unavailable,
        ]
        .into_iter()
        .map(|state| (state, per_state.get(&state).copied().unwrap_or_default()))
        .collect();

        CacheStats {
            guilds,
            guild_channels: self.guild_channels.read().len(),
            private_channels: self.private_channels.read().len(),
            members,
        }
    }
}

impl Default for Cache {
    fn default() -> Self {
        Cache::new()
    }
}
