use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::cache::{Cache, User};
use crate::model::{MemberPayload, MemberUpdate};
use crate::util::markers::{GuildId, RoleId, UserId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Member {
    pub user: Arc<User>,
    pub nickname: Option<String>,
    pub avatar: Option<String>,
    pub roles: Vec<RoleId>,
    // lurkers in stage channels have no join date
    pub joined_at: Option<DateTime<Utc>>,
    pub deaf: bool,
    pub mute: bool,
    pub pending: bool,
    pub communication_disabled_until: Option<DateTime<Utc>>,
}

impl Member {
    pub fn from_member(member: MemberPayload) -> Self {
        Member::assemble(member, None)
    }

    pub fn assemble(member: MemberPayload, old_user: Option<Arc<User>>) -> Self {
        Member {
            user: User::assemble(member.user, old_user),
            nickname: member.nick,
            avatar: member.avatar,
            roles: member.roles,
            joined_at: member.joined_at,
            deaf: member.deaf,
            mute: member.mute,
            pending: member.pending,
            communication_disabled_until: member.communication_disabled_until,
        }
    }

    /// Apply an update on top of this member. Updates don't carry join date or voice flags so
    /// those are kept.
    pub fn updated(&self, member: MemberUpdate) -> Self {
        Member {
            user: User::assemble(member.user, Some(self.user.clone())),
            nickname: member.nick,
            avatar: member.avatar,
            roles: member.roles,
            joined_at: self.joined_at,
            deaf: self.deaf,
            mute: self.mute,
            pending: member.pending,
            communication_disabled_until: member.communication_disabled_until,
        }
    }

    pub fn is_updated(&self, member: &MemberUpdate) -> bool {
        self.nickname != member.nick
            || self.avatar != member.avatar
            || self.pending != member.pending
            || self.communication_disabled_until != member.communication_disabled_until
            || self.roles != member.roles
            || self.user.is_updated(&member.user)
    }
}

impl Cache {
    pub fn get_member(&self, guild_id: &GuildId, user_id: &UserId) -> Option<Arc<Member>> {
        self.get_guild(guild_id)?.get_member(user_id)
    }

    pub fn get_members(&self, guild_id: &GuildId) -> Vec<Arc<Member>> {
        self.get_guild(guild_id).map(|guild| guild.members()).unwrap_or_default()
    }
}
