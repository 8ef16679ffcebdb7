use std::sync::Arc;

use crate::cache::Cache;
use crate::model::{CurrentUserPayload, UserPayload};
use crate::util::markers::UserId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub global_name: Option<String>,
    pub avatar: Option<String>,
    pub bot: bool,
}

impl User {
    pub fn from_user(user: UserPayload) -> Self {
        User {
            id: user.id,
            name: user.username,
            global_name: user.global_name,
            avatar: user.avatar,
            bot: user.bot,
        }
    }

    // bot status can't change so only check those that could have been changed
    pub fn is_updated(&self, user: &UserPayload) -> bool {
        self.name != user.username || self.global_name != user.global_name || self.avatar != user.avatar
    }

    /// Reuse the old user when nothing changed, so members keep pointing at the same allocation
    pub fn assemble(user: UserPayload, old: Option<Arc<User>>) -> Arc<User> {
        match old {
            Some(old) if !old.is_updated(&user) => old,
            _ => Arc::new(User::from_user(user)),
        }
    }
}

/// The account this process is connected as
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub global_name: Option<String>,
    pub avatar: Option<String>,
    pub bot: bool,
    pub mfa_enabled: bool,
    pub verified: Option<bool>,
    pub locale: Option<String>,
}

impl CurrentUser {
    pub fn from_user(user: CurrentUserPayload) -> Self {
        CurrentUser {
            id: user.id,
            name: user.username,
            global_name: user.global_name,
            avatar: user.avatar,
            bot: user.bot,
            mfa_enabled: user.mfa_enabled,
            verified: user.verified,
            locale: user.locale,
        }
    }
}

impl Cache {
    pub fn current_user(&self) -> Option<Arc<CurrentUser>> {
        self.current_user.read().clone()
    }

    pub(crate) fn set_current_user(&self, user: Arc<CurrentUser>) -> Option<Arc<CurrentUser>> {
        self.current_user.write().replace(user)
    }
}
