use crate::cache::Cache;
use crate::events::{ApplyOutcome, Condition};
use crate::model::GuildEmojisUpdate;

pub fn on_emoji_update(emoji_update: GuildEmojisUpdate, cache: &Cache) -> ApplyOutcome {
    if let Some(guild) = cache.get_guild(&emoji_update.guild_id) {
        guild.update_emoji(emoji_update.emojis);
        ApplyOutcome::Changed
    } else {
        ApplyOutcome::Condition(Condition::UnknownGuild(emoji_update.guild_id))
    }
}
