use std::sync::Arc;

use tracing::trace;

use crate::cache::{Cache, Channel};
use crate::events::{ApplyOutcome, Condition};
use crate::model::ChannelPayload;

pub fn on_channel_create(channel: ChannelPayload, cache: &Cache) -> ApplyOutcome {
    trace!("Channel {} created", channel.id);
    cache_channel_upsert(channel, cache)
}

pub fn on_channel_update(channel: ChannelPayload, cache: &Cache) -> ApplyOutcome {
    trace!("Channel {} updated", channel.id);
    cache_channel_upsert(channel, cache)
}

// creates and updates are handled the same, whatever we had is replaced
fn cache_channel_upsert(channel: ChannelPayload, cache: &Cache) -> ApplyOutcome {
    if channel.is_private() {
        cache.insert_private_channel(Arc::new(Channel::from_private_channel(channel)));
        return ApplyOutcome::Changed;
    }

    let Some(guild_id) = channel.guild_id else {
        // a guild channel without a guild can't be placed anywhere
        return ApplyOutcome::Condition(Condition::UnknownChannel(channel.id));
    };
    match cache.get_guild(&guild_id) {
        Some(guild) => {
            let new = Arc::new(Channel::from_guild_channel(guild_id, channel));
            cache.insert_guild_channel(&guild, new);
            ApplyOutcome::Changed
        }
        None => ApplyOutcome::Condition(Condition::UnknownGuild(guild_id)),
    }
}

pub fn on_channel_delete(channel: ChannelPayload, cache: &Cache) -> ApplyOutcome {
    match cache.remove_channel(&channel.id) {
        Some(_) => ApplyOutcome::Changed,
        None => ApplyOutcome::Condition(Condition::UnknownChannel(channel.id)),
    }
}
