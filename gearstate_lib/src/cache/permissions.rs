use std::sync::Arc;

use twilight_model::guild::Permissions;
use twilight_model::id::marker::{GenericMarker, RoleMarker};

use crate::cache::{Cache, Channel, Member, Role};
use crate::model::OverwriteKind;
use crate::util::markers::{ChannelId, GenericId, GuildId, UserId};

impl Cache {
    /// Effective permissions of a member in one of the channels of their guild. `None` when the
    /// guild, channel or member isn't cached.
    pub fn member_permissions(
        &self,
        guild_id: &GuildId,
        channel_id: &ChannelId,
        user_id: &UserId,
    ) -> Option<Permissions> {
        let guild = self.get_guild(guild_id)?;
        let channel = guild.channel(channel_id)?;
        let member = guild.get_member(user_id)?;

        let everyone = guild.role(&guild_id.cast::<RoleMarker>());
        let roles: Vec<Arc<Role>> = member.roles.iter().filter_map(|role_id| guild.role(role_id)).collect();

        Some(channel_permissions(
            *guild_id,
            guild.owner_id(),
            everyone.as_deref(),
            &roles,
            &member,
            &channel,
        ))
    }
}

/// Guild wide permissions of a member, before any channel overwrites
pub fn guild_permissions(owner_id: UserId, everyone: Option<&Role>, roles: &[Arc<Role>], member: &Member) -> Permissions {
    if member.user.id == owner_id {
        return Permissions::all();
    }

    let mut permissions = everyone.map(|role| role.permissions).unwrap_or_else(Permissions::empty);
    for role in roles {
        permissions |= role.permissions;
    }

    if permissions.contains(Permissions::ADMINISTRATOR) {
        return Permissions::all();
    }
    permissions
}

pub fn channel_permissions(
    guild_id: GuildId,
    owner_id: UserId,
    everyone: Option<&Role>,
    roles: &[Arc<Role>],
    member: &Member,
    channel: &Channel,
) -> Permissions {
    let mut permissions = guild_permissions(owner_id, everyone, roles, member);
    if permissions == Permissions::all() {
        return permissions;
    }

    let overwrites = &channel.permission_overwrites;

    // @everyone shares its id with the guild
    let everyone_id: GenericId = guild_id.cast();
    if let Some(overwrite) = overwrites.iter().find(|o| o.id == everyone_id) {
        permissions.remove(overwrite.deny);
        permissions.insert(overwrite.allow);
    }

    let mut allow = Permissions::empty();
    let mut deny = Permissions::empty();
    for overwrite in overwrites.iter().filter(|o| o.kind == OverwriteKind::Role) {
        if member.roles.iter().any(|role_id| overwrite.id == role_id.cast::<GenericMarker>()) {
            allow |= overwrite.allow;
            deny |= overwrite.deny;
        }
    }
    permissions.remove(deny);
    permissions.insert(allow);

    let member_id: GenericId = member.user.id.cast();
    if let Some(overwrite) = overwrites
        .iter()
        .find(|o| o.kind == OverwriteKind::Member && o.id == member_id)
    {
        permissions.remove(overwrite.deny);
        permissions.insert(overwrite.allow);
    }

    permissions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::User;
    use crate::model::PermissionOverwrite;
    use twilight_model::channel::ChannelType;
    use twilight_model::id::Id;

    const GUILD: u64 = 100;
    const OWNER: u64 = 1;
    const USER: u64 = 2;
    const MOD_ROLE: u64 = 50;

    fn role(id: u64, permissions: Permissions) -> Arc<Role> {
        Arc::new(Role {
            id: Id::new(id),
            name: format!("role {}", id),
            color: 0,
            hoisted: false,
            icon: None,
            emoji: None,
            position: 0,
            permissions,
            managed: false,
            mentionable: false,
        })
    }

    fn member(id: u64, roles: &[u64]) -> Member {
        Member {
            user: Arc::new(User {
                id: Id::new(id),
                name: "someone".to_string(),
                global_name: None,
                avatar: None,
                bot: false,
            }),
            nickname: None,
            avatar: None,
            roles: roles.iter().map(|id| Id::new(*id)).collect(),
            joined_at: None,
            deaf: false,
            mute: false,
            pending: false,
            communication_disabled_until: None,
        }
    }

    fn channel(overwrites: Vec<PermissionOverwrite>) -> Channel {
        Channel {
            id: Id::new(200),
            guild_id: Some(Id::new(GUILD)),
            kind: ChannelType::GuildText,
            name: Some("general".to_string()),
            topic: None,
            position: 0,
            nsfw: false,
            permission_overwrites: overwrites,
            parent_id: None,
            bitrate: 0,
            user_limit: 0,
            user_rate_limit: 0,
            recipients: Vec::new(),
        }
    }

    fn overwrite(id: u64, kind: OverwriteKind, allow: Permissions, deny: Permissions) -> PermissionOverwrite {
        PermissionOverwrite {
            id: Id::new(id),
            kind,
            allow,
            deny,
        }
    }

    fn everyone() -> Arc<Role> {
        role(GUILD, Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES)
    }

    #[test]
    fn owner_gets_everything() {
        let channel = channel(vec![overwrite(
            GUILD,
            OverwriteKind::Role,
            Permissions::empty(),
            Permissions::VIEW_CHANNEL,
        )]);
        let permissions = channel_permissions(
            Id::new(GUILD),
            Id::new(OWNER),
            Some(everyone().as_ref()),
            &[],
            &member(OWNER, &[]),
            &channel,
        );
        assert_eq!(permissions, Permissions::all());
    }

    #[test]
    fn administrator_ignores_overwrites() {
        let admin = role(MOD_ROLE, Permissions::ADMINISTRATOR);
        let channel = channel(vec![overwrite(
            MOD_ROLE,
            OverwriteKind::Role,
            Permissions::empty(),
            Permissions::all(),
        )]);
        let permissions = channel_permissions(
            Id::new(GUILD),
            Id::new(OWNER),
            Some(everyone().as_ref()),
            &[admin],
            &member(USER, &[MOD_ROLE]),
            &channel,
        );
        assert_eq!(permissions, Permissions::all());
    }

    #[test]
    fn overwrites_apply_in_order() {
        let moderator = role(MOD_ROLE, Permissions::MANAGE_MESSAGES);
        let channel = channel(vec![
            overwrite(GUILD, OverwriteKind::Role, Permissions::empty(), Permissions::SEND_MESSAGES),
            overwrite(MOD_ROLE, OverwriteKind::Role, Permissions::SEND_MESSAGES, Permissions::empty()),
            overwrite(USER, OverwriteKind::Member, Permissions::empty(), Permissions::MANAGE_MESSAGES),
        ]);
        let permissions = channel_permissions(
            Id::new(GUILD),
            Id::new(OWNER),
            Some(everyone().as_ref()),
            &[moderator],
            &member(USER, &[MOD_ROLE]),
            &channel,
        );
        assert_eq!(permissions, Permissions::VIEW_CHANNEL | Permissions::SEND_MESSAGES);
    }

    #[test]
    fn everyone_overwrite_applies_without_roles() {
        let channel = channel(vec![overwrite(
            GUILD,
            OverwriteKind::Role,
            Permissions::empty(),
            Permissions::VIEW_CHANNEL,
        )]);
        let permissions = channel_permissions(
            Id::new(GUILD),
            Id::new(OWNER),
            Some(everyone().as_ref()),
            &[],
            &member(USER, &[]),
            &channel,
        );
        assert_eq!(permissions, Permissions::SEND_MESSAGES);
    }
}
