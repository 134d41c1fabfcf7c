//! Database module exports.

pub mod models;
mod mongo;
pub mod repository;

pub use models::{CustomPrefix, GuildBotId};
pub use mongo::Database;
pub use repository::{PrefixRepository, PrefixStore};
