use std::sync::Arc;

use tracing::{trace, warn};

use crate::cache::{Cache, GuildCacheState, Member};
use crate::events::{ApplyOutcome, Condition};
use crate::model::{MemberAdd, MemberRemove, MemberUpdate};

pub fn on_member_add(member: MemberAdd, cache: &Cache) -> ApplyOutcome {
    let user_id = member.member.user.id;
    trace!("Member {} joined {}", user_id, member.guild_id);
    if let Some(guild) = cache.get_guild(&member.guild_id) {
        let old_user = guild.get_member(&user_id).map(|old| old.user.clone());
        guild.add_member(user_id, Arc::new(Member::assemble(member.member, old_user)));
        ApplyOutcome::Changed
    } else {
        ApplyOutcome::Condition(Condition::UnknownGuild(member.guild_id))
    }
}

pub fn on_member_update(member_update: MemberUpdate, cache: &Cache) -> ApplyOutcome {
    let user_id = member_update.user.id;
    let guild_id = member_update.guild_id;
    trace!("Member {} updated on guild {}", user_id, guild_id);

    let Some(guild) = cache.get_guild(&guild_id) else {
        return ApplyOutcome::Condition(Condition::UnknownGuild(guild_id));
    };
    let Some(old_member) = guild.get_member(&user_id) else {
        return ApplyOutcome::Condition(Condition::UnknownMember { guild_id, user_id });
    };

    if !old_member.is_updated(&member_update) {
        return ApplyOutcome::Suppressed;
    }
    guild.insert_member(user_id, Arc::new(old_member.updated(member_update)));
    ApplyOutcome::Changed
}

pub fn on_member_remove(member_remove: MemberRemove, cache: &Cache) -> ApplyOutcome {
    trace!("User {} left {}", member_remove.user.id, member_remove.guild_id);

    if let Some(guild) = cache.get_guild(&member_remove.guild_id) {
        let old = guild.remove_member(&member_remove.user.id);
        if old.is_none() && guild.cache_state() == GuildCacheState::Cached {
            warn!(
                "Got a member remove event for a user ({}) that wasn't cached in that guild ({})",
                member_remove.user.id, member_remove.guild_id
            );
        }
        ApplyOutcome::Changed
    } else {
        ApplyOutcome::Condition(Condition::UnknownGuild(member_remove.guild_id))
    }
}
