use std::sync::Arc;

use crate::cache::{Cache, Role};
use crate::events::{ApplyOutcome, Condition};
use crate::model::{RoleDelete, RoleUpsert};

pub fn on_role_create(role_create: RoleUpsert, cache: &Cache) -> ApplyOutcome {
    cache_role_upsert(role_create, cache)
}

pub fn on_role_update(role_update: RoleUpsert, cache: &Cache) -> ApplyOutcome {
    cache_role_upsert(role_update, cache)
}

fn cache_role_upsert(upsert: RoleUpsert, cache: &Cache) -> ApplyOutcome {
    let Some(guild) = cache.get_guild(&upsert.guild_id) else {
        return ApplyOutcome::Condition(Condition::UnknownGuild(upsert.guild_id));
    };
    let new: Arc<Role> = Arc::new(Role::from_role(upsert.role));
    let _old = guild.insert_role(new);
    ApplyOutcome::Changed
}

pub fn on_role_delete(role_delete: RoleDelete, cache: &Cache) -> ApplyOutcome {
    let Some(guild) = cache.get_guild(&role_delete.guild_id) else {
        return ApplyOutcome::Condition(Condition::UnknownGuild(role_delete.guild_id));
    };
    let _old = guild.remove_role(&role_delete.role_id);
    ApplyOutcome::Changed
}
