//! Custom command prefixes.
//!
//! `PrefixService` owns the prefix cache and is the only thing that reads
//! or writes prefixes. Reads go through the cache, writes go to the store
//! first and then invalidate the cached entry.

mod service;
mod update;

pub use crate::database::CustomPrefix;
pub use service::PrefixService;
pub use update::PrefixUpdate;
