use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{PresencePayload, UserPayload};
use crate::util::markers::{GuildId, RoleId, UserId};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct MemberPayload {
    pub user: UserPayload,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub roles: Vec<RoleId>,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deaf: bool,
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub pending: bool,
    #[serde(default)]
    pub communication_disabled_until: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct MemberAdd {
    pub guild_id: GuildId,
    #[serde(flatten)]
    pub member: MemberPayload,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct MemberRemove {
    pub guild_id: GuildId,
    pub user: UserPayload,
}

/// Partial member, the gateway leaves out the voice flags on updates
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct MemberUpdate {
    pub guild_id: GuildId,
    pub user: UserPayload,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub roles: Vec<RoleId>,
    #[serde(default)]
    pub pending: bool,
    #[serde(default)]
    pub communication_disabled_until: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct MemberChunk {
    pub guild_id: GuildId,
    pub members: Vec<MemberPayload>,
    pub chunk_index: u32,
    pub chunk_count: u32,
    #[serde(default)]
    pub not_found: Vec<UserId>,
    #[serde(default)]
    pub presences: Vec<PresencePayload>,
}

impl MemberChunk {
    pub fn is_last(&self) -> bool {
        self.chunk_index + 1 >= self.chunk_count
    }
}
