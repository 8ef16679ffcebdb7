use std::sync::Arc;

use crate::cache::Cache;
use crate::model::EmojiPayload;
use crate::util::markers::{EmojiId, GuildId, RoleId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Emoji {
    pub id: EmojiId,
    pub name: String,
    pub roles: Vec<RoleId>,
    pub animated: bool,
    pub available: bool,
    pub managed: bool,
}

impl Emoji {
    pub fn from_emoji(emoji: EmojiPayload) -> Self {
        Emoji {
            id: emoji.id,
            name: emoji.name,
            roles: emoji.roles,
            animated: emoji.animated,
            available: emoji.available,
            managed: emoji.managed,
        }
    }
}

impl Cache {
    pub fn get_emoji(&self, guild_id: &GuildId, emoji_id: &EmojiId) -> Option<Arc<Emoji>> {
        self.get_guild(guild_id)?.emoji(emoji_id)
    }

    pub fn get_emojis(&self, guild_id: &GuildId) -> Vec<Arc<Emoji>> {
        self.get_guild(guild_id).map(|guild| guild.emojis()).unwrap_or_default()
    }
}
