use std::sync::Arc;

use tracing::{debug, info, trace};

use crate::cache::{Cache, Guild, GuildEntry, Member, Presence};
use crate::events::{ApplyOutcome, Condition};
use crate::model::{GuildDelete, GuildPayload, MemberChunk, PartialGuildPayload};

pub fn on_guild_create(guild: GuildPayload, cache: &Cache) -> ApplyOutcome {
    let guild_id = guild.id();
    match cache.guild_entry(&guild_id) {
        Some(GuildEntry::Available(existing)) => {
            // we already have it, take the fresh data but let it be known this shouldn't happen
            debug!("Received a guild create for guild {} that was already cached, merging", guild_id);
            let channels = existing.refresh(guild);
            cache.replace_guild_channels(&existing, channels);
            ApplyOutcome::Condition(Condition::GuildAlreadyExists(guild_id))
        }
        Some(GuildEntry::Unavailable) => {
            trace!("Guild {} is available", guild_id);
            cache.insert_guild(Arc::new(Guild::from_payload(guild)));
            ApplyOutcome::Suppressed
        }
        None => ApplyOutcome::Condition(Condition::UnknownGuild(guild_id)),
    }
}

pub fn on_guild_update(guild: PartialGuildPayload, cache: &Cache) -> ApplyOutcome {
    let guild_id = guild.id;
    if let Some(existing) = cache.get_guild(&guild_id) {
        existing.update(guild);
        trace!("Updated guild {}", guild_id);
        ApplyOutcome::Changed
    } else {
        ApplyOutcome::Condition(Condition::UnknownGuild(guild_id))
    }
}

pub fn on_guild_delete(event: GuildDelete, cache: &Cache) -> ApplyOutcome {
    if cache.guild_entry(&event.id).is_none() {
        return ApplyOutcome::Condition(Condition::UnknownGuild(event.id));
    }

    if event.unavailable {
        cache.mark_guild_unavailable(event.id);
        info!("Guild {} became unavailable", event.id);
    } else {
        cache.remove_guild(&event.id);
        info!("Removed from guild {}", event.id);
    }
    ApplyOutcome::Changed
}

pub fn on_member_chunk(chunk: MemberChunk, cache: &Cache) -> ApplyOutcome {
    let member_count = chunk.members.len();
    trace!(
        "Received chunk {}/{} for guild {} with {} members",
        chunk.chunk_index + 1,
        chunk.chunk_count,
        chunk.guild_id,
        member_count
    );

    let Some(guild) = cache.get_guild(&chunk.guild_id) else {
        return ApplyOutcome::Condition(Condition::UnknownGuild(chunk.guild_id));
    };

    let last = chunk.is_last();
    // assemble first, the guild holds its member lock while receiving
    let members: Vec<_> = chunk
        .members
        .into_iter()
        .map(|member| {
            let uid = member.user.id;
            let old_user = guild.get_member(&uid).map(|old| old.user.clone());
            (uid, Arc::new(Member::assemble(member, old_user)))
        })
        .collect();
    let inserted = guild.receive_members(members.into_iter(), last);
    for presence in chunk.presences {
        let user_id = presence.user.id;
        guild.set_presence(user_id, Presence::from_presence(presence).map(Arc::new));
    }
    if !chunk.not_found.is_empty() {
        debug!("{} requested members were not found in guild {}", chunk.not_found.len(), chunk.guild_id);
    }
    trace!("{} of {} chunked members were new", inserted, member_count);

    ApplyOutcome::Changed
}
