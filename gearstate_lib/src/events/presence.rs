use std::sync::Arc;

use crate::cache::{Cache, Presence};
use crate::events::{ApplyOutcome, Condition};
use crate::model::PresencePayload;

pub fn on_presence_update(update: PresencePayload, cache: &Cache) -> ApplyOutcome {
    let Some(guild_id) = update.guild_id else {
        return ApplyOutcome::Suppressed;
    };
    if let Some(guild) = cache.get_guild(&guild_id) {
        let user_id = update.user.id;
        let new = Presence::from_presence(update).map(Arc::new);
        let _old = guild.set_presence(user_id, new);
        ApplyOutcome::Changed
    } else {
        ApplyOutcome::Condition(Condition::UnknownGuild(guild_id))
    }
}
