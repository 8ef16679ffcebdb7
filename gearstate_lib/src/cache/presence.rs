use std::sync::Arc;

use twilight_model::gateway::presence::Status;

use crate::cache::Cache;
use crate::model::{ActivityPayload, PresencePayload};
use crate::util::markers::{GuildId, UserId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Presence {
    pub user_id: UserId,
    pub status: Status,
    pub activities: Vec<ActivityPayload>,
}

impl Presence {
    /// Offline users don't get a presence, they are removed instead
    pub fn from_presence(presence: PresencePayload) -> Option<Self> {
        if presence.status == Status::Offline {
            return None;
        }
        Some(Presence {
            user_id: presence.user.id,
            status: presence.status,
            activities: presence.activities,
        })
    }
}

impl Cache {
    pub fn get_presence(&self, guild_id: &GuildId, user_id: &UserId) -> Option<Arc<Presence>> {
        self.get_guild(guild_id)?.presence(user_id)
    }
}
