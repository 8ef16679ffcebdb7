use serde::{Deserialize, Serialize};
use twilight_model::channel::ChannelType;
use twilight_model::guild::Permissions;

use crate::model::UserPayload;
use crate::util::markers::{ChannelId, GenericId, GuildId};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct ChannelPayload {
    pub id: ChannelId,
    #[serde(rename = "type")]
    pub kind: ChannelType,
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub position: i32,
    #[serde(default)]
    pub nsfw: bool,
    #[serde(default)]
    pub permission_overwrites: Vec<PermissionOverwrite>,
    #[serde(default)]
    pub parent_id: Option<ChannelId>,
    #[serde(default)]
    pub bitrate: Option<u32>,
    #[serde(default)]
    pub user_limit: Option<u32>,
    #[serde(default)]
    pub rate_limit_per_user: Option<u16>,
    #[serde(default)]
    pub recipients: Vec<UserPayload>,
}

impl ChannelPayload {
    pub fn is_private(&self) -> bool {
        is_private_kind(self.kind)
    }
}

pub fn is_private_kind(kind: ChannelType) -> bool {
    matches!(kind, ChannelType::Private | ChannelType::Group)
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct PermissionOverwrite {
    /// Role or user id, depending on the kind
    pub id: GenericId,
    #[serde(rename = "type")]
    pub kind: OverwriteKind,
    pub allow: Permissions,
    pub deny: Permissions,
}

#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(try_from = "u8", into = "u8")]
pub enum OverwriteKind {
    Role,
    Member,
}

impl TryFrom<u8> for OverwriteKind {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OverwriteKind::Role),
            1 => Ok(OverwriteKind::Member),
            other => Err(format!("unknown permission overwrite type {}", other)),
        }
    }
}

impl From<OverwriteKind> for u8 {
    fn from(kind: OverwriteKind) -> Self {
        match kind {
            OverwriteKind::Role => 0,
            OverwriteKind::Member => 1,
        }
    }
}
