use std::sync::Arc;

use crate::cache::Cache;
use crate::model::VoiceStatePayload;
use crate::util::markers::{ChannelId, GuildId, UserId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoiceState {
    pub user_id: UserId,
    pub connected_to: ChannelId,
    pub session_id: String,
    pub muted: bool,
    pub server_muted: bool,
    pub deafened: bool,
    pub server_deafened: bool,
    pub video: bool,
    pub streaming: bool,
    pub suppressed: bool,
}

impl VoiceState {
    /// Only users that are actually connected to a channel have a voice state
    pub fn from_state(state: VoiceStatePayload) -> Option<Self> {
        let connected_to = state.channel_id?;
        Some(VoiceState {
            user_id: state.user_id,
            connected_to,
            session_id: state.session_id,
            muted: state.self_mute,
            server_muted: state.mute,
            deafened: state.self_deaf,
            server_deafened: state.deaf,
            video: state.self_video,
            streaming: state.self_stream,
            suppressed: state.suppress,
        })
    }
}

impl Cache {
    pub fn get_voice_state(&self, guild_id: &GuildId, user_id: &UserId) -> Option<Arc<VoiceState>> {
        self.get_guild(guild_id)?.voice_state(user_id)
    }

    pub fn get_voice_states(&self, guild_id: &GuildId) -> Vec<Arc<VoiceState>> {
        self.get_guild(guild_id)
            .map(|guild| guild.voice_states())
            .unwrap_or_default()
    }
}
