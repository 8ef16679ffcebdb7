use std::sync::Arc;

use twilight_model::guild::Permissions;

use crate::cache::Cache;
use crate::model::RolePayload;
use crate::util::markers::{GuildId, RoleId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Role {
    // cache role id as well since we need it for role ordering
    pub id: RoleId,
    pub name: String,
    pub color: u32,
    pub hoisted: bool,
    pub icon: Option<String>,
    pub emoji: Option<String>,
    pub position: i64,
    pub permissions: Permissions,
    pub managed: bool,
    pub mentionable: bool,
}

impl Role {
    pub fn from_role(role: RolePayload) -> Self {
        Role {
            id: role.id,
            name: role.name,
            color: role.color,
            hoisted: role.hoist,
            icon: role.icon,
            emoji: role.unicode_emoji,
            position: role.position,
            permissions: role.permissions,
            managed: role.managed,
            mentionable: role.mentionable,
        }
    }
}

impl Cache {
    pub fn get_role(&self, guild_id: &GuildId, role_id: &RoleId) -> Option<Arc<Role>> {
        self.get_guild(guild_id)?.role(role_id)
    }

    pub fn get_roles(&self, guild_id: &GuildId) -> Vec<Arc<Role>> {
        self.get_guild(guild_id).map(|guild| guild.roles()).unwrap_or_default()
    }
}
