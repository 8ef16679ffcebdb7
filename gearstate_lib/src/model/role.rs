use serde::{Deserialize, Serialize};
use twilight_model::guild::Permissions;

use crate::util::markers::{EmojiId, RoleId};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct RolePayload {
    pub id: RoleId,
    pub name: String,
    #[serde(default)]
    pub color: u32,
    #[serde(default)]
    pub hoist: bool,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub unicode_emoji: Option<String>,
    pub position: i64,
    pub permissions: Permissions,
    #[serde(default)]
    pub managed: bool,
    #[serde(default)]
    pub mentionable: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct EmojiPayload {
    pub id: EmojiId,
    pub name: String,
    #[serde(default)]
    pub roles: Vec<RoleId>,
    #[serde(default)]
    pub animated: bool,
    #[serde(default = "available_by_default")]
    pub available: bool,
    #[serde(default)]
    pub managed: bool,
}

fn available_by_default() -> bool {
    true
}
