use serde::{Deserialize, Serialize};
use twilight_model::guild::{MfaLevel, VerificationLevel};

use crate::model::{ChannelPayload, EmojiPayload, MemberPayload, PresencePayload, RolePayload, VoiceStatePayload};
use crate::util::markers::{GuildId, UserId};

/// Guild update payload: the guild attributes plus roles and emoji, no members or channels
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct PartialGuildPayload {
    pub id: GuildId,
    pub name: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub splash: Option<String>,
    #[serde(default)]
    pub banner: Option<String>,
    pub owner_id: UserId,
    #[serde(default)]
    pub region: Option<String>,
    pub verification_level: VerificationLevel,
    pub mfa_level: MfaLevel,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub vanity_url_code: Option<String>,
    #[serde(default)]
    pub preferred_locale: Option<String>,
    #[serde(default)]
    pub max_members: Option<u64>,
    #[serde(default)]
    pub roles: Vec<RolePayload>,
    #[serde(default)]
    pub emojis: Vec<EmojiPayload>,
}

/// Full guild as sent when it becomes available or when we join it
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct GuildPayload {
    #[serde(flatten)]
    pub guild: PartialGuildPayload,
    #[serde(default)]
    pub member_count: Option<u64>,
    #[serde(default)]
    pub channels: Vec<ChannelPayload>,
    #[serde(default)]
    pub members: Vec<MemberPayload>,
    #[serde(default)]
    pub voice_states: Vec<VoiceStatePayload>,
    #[serde(default)]
    pub presences: Vec<PresencePayload>,
}

impl GuildPayload {
    pub fn id(&self) -> GuildId {
        self.guild.id
    }
}
