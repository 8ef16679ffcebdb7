use serde::{Deserialize, Serialize};

use crate::util::markers::{ChannelId, GuildId, UserId};

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct VoiceStatePayload {
    #[serde(default)]
    pub guild_id: Option<GuildId>,
    /// `None` when the user left voice
    #[serde(default)]
    pub channel_id: Option<ChannelId>,
    pub user_id: UserId,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub deaf: bool,
    #[serde(default)]
    pub mute: bool,
    #[serde(default)]
    pub self_deaf: bool,
    #[serde(default)]
    pub self_mute: bool,
    #[serde(default)]
    pub self_stream: bool,
    #[serde(default)]
    pub self_video: bool,
    #[serde(default)]
    pub suppress: bool,
}
