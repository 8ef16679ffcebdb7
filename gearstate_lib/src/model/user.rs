use serde::{Deserialize, Serialize};

use crate::util::markers::UserId;

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct UserPayload {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

/// The account we are logged in as
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
pub struct CurrentUserPayload {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub bot: bool,
    #[serde(default)]
    pub mfa_enabled: bool,
    #[serde(default)]
    pub verified: Option<bool>,
    #[serde(default)]
    pub locale: Option<String>,
}
