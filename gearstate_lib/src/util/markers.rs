use twilight_model::id::marker::{ChannelMarker, EmojiMarker, GenericMarker, GuildMarker, RoleMarker, UserMarker};
use twilight_model::id::Id;

pub type ChannelId = Id<ChannelMarker>;
pub type EmojiId = Id<EmojiMarker>;
pub type GenericId = Id<GenericMarker>;
pub type GuildId = Id<GuildMarker>;
pub type RoleId = Id<RoleMarker>;
pub type UserId = Id<UserMarker>;
