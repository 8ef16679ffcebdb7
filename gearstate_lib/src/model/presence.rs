use serde::{Deserialize, Serialize};
use twilight_model::gateway::presence::{ActivityType, Status};

use crate::util::markers::{GuildId, UserId};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct PresencePayload {
    pub user: PresenceUser,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    pub status: Status,
    #[serde(default)]
    pub activities: Vec<ActivityPayload>,
}

/// Presences only carry the user id reliably, the rest of the user object is optional
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct PresenceUser {
    pub id: UserId,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ActivityPayload {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}
