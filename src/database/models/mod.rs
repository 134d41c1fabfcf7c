//! Database models.

pub mod prefix;

pub use prefix::{CustomPrefix, GuildBotId, PrefixRecord};
