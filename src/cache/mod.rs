//! Cache module - Read-through caching in front of the database.
//!
//! ## Architecture
//!
//! - `LoadingCache` - Generic read-through cache with background refresh
//!   and idle eviction, striped for concurrent access
//! - `CacheConfig` - Refresh interval, idle window and striping
//! - `CacheRegistry` - Named metrics sink caches publish their stats to
//!
//! ## Usage
//!
//! ```rust
//! let prefixes = LoadingCache::new("customPrefixes", loader, CacheConfig::with_workers(16));
//! let _maintenance = prefixes.spawn_maintenance();
//! registry.register("customPrefixes", Arc::new(prefixes.clone()));
//!
//! let prefix = prefixes.get(&chat_id).await?;
//! prefixes.invalidate(&chat_id);
//! ```

mod config;
mod loading;
mod registry;
mod stats;

pub use config::{CacheConfig, MIN_INTERVAL};
pub use loading::{Loader, LoadingCache, MaintenanceHandle};
pub use registry::{CacheRegistry, StatsSource};
pub use stats::{CacheStats, CacheStatsSnapshot};
