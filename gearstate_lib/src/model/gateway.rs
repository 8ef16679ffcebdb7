use serde::{Deserialize, Serialize};

use crate::model::{ChannelPayload, CurrentUserPayload, EmojiPayload, RolePayload};
use crate::util::markers::{GuildId, RoleId};

/// Initial snapshot after (re)connecting. Guilds only carry their id, the full guilds follow as
/// separate guild creates.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct Ready {
    pub user: CurrentUserPayload,
    pub guilds: Vec<UnavailableGuild>,
    #[serde(default)]
    pub private_channels: Vec<ChannelPayload>,
    #[serde(default)]
    pub session_id: String,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct UnavailableGuild {
    pub id: GuildId,
    #[serde(default)]
    pub unavailable: bool,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct GuildDelete {
    pub id: GuildId,
    /// Set when this is an outage rather than us leaving the guild
    #[serde(default)]
    pub unavailable: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct GuildEmojisUpdate {
    pub guild_id: GuildId,
    pub emojis: Vec<EmojiPayload>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct RoleUpsert {
    pub guild_id: GuildId,
    pub role: RolePayload,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct RoleDelete {
    pub guild_id: GuildId,
    pub role_id: RoleId,
}
