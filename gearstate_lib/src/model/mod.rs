//! Payloads as they arrive from the gateway, already decoded. The cache converts these into its
//! own leaner types.

pub mod channel;
pub mod gateway;
pub mod guild;
pub mod member;
pub mod presence;
pub mod role;
pub mod user;
pub mod voice;

pub use channel::{ChannelPayload, OverwriteKind, PermissionOverwrite};
pub use gateway::{GuildDelete, GuildEmojisUpdate, Ready, RoleDelete, RoleUpsert, UnavailableGuild};
pub use guild::{GuildPayload, PartialGuildPayload};
pub use member::{MemberAdd, MemberChunk, MemberPayload, MemberRemove, MemberUpdate};
pub use presence::{ActivityPayload, PresencePayload, PresenceUser};
pub use role::{EmojiPayload, RolePayload};
pub use user::{CurrentUserPayload, UserPayload};
pub use voice::VoiceStatePayload;
