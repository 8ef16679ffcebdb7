use std::sync::Arc;

use crate::cache::{Cache, VoiceState};
use crate::events::{ApplyOutcome, Condition};
use crate::model::VoiceStatePayload;

pub fn on_voice_state_update(update: VoiceStatePayload, cache: &Cache) -> ApplyOutcome {
    // private call voice states, we only track guilds
    let Some(guild_id) = update.guild_id else {
        return ApplyOutcome::Suppressed;
    };
    if let Some(guild) = cache.get_guild(&guild_id) {
        let user_id = update.user_id;
        let new = VoiceState::from_state(update).map(Arc::new);
        let _old = guild.set_voice_state(user_id, new);
        ApplyOutcome::Changed
    } else {
        ApplyOutcome::Condition(Condition::UnknownGuild(guild_id))
    }
}
