//! Cache registry - Named metrics sink for all caches.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use super::CacheStatsSnapshot;

/// Anything that can report cache statistics.
pub trait StatsSource: Send + Sync {
    fn stats_snapshot(&self) -> CacheStatsSnapshot;
}

/// Central registry where caches publish their statistics by name.
///
/// Registration is optional: a cache that is never registered behaves
/// exactly the same, it just doesn't show up in [`CacheRegistry::snapshot`].
///
/// ## Example
///
/// ```rust
/// let registry = CacheRegistry::new();
/// registry.register("customPrefixes", prefix_cache.clone());
///
/// for (name, stats) in registry.snapshot() {
///     println!("{name}: {:.2}", stats.hit_rate);
/// }
/// ```
#[derive(Clone, Default)]
pub struct CacheRegistry {
    sources: Arc<RwLock<BTreeMap<String, Arc<dyn StatsSource>>>>,
}

impl CacheRegistry {
    /// Create a new empty cache registry.
    pub fn new() -> Self {
        info!("Cache registry initialized");
        Self::default()
    }

    /// Register a stats source under `name`.
    ///
    /// Registering the same name again replaces the previous source.
    pub fn register(&self, name: &str, source: Arc<dyn StatsSource>) {
        let replaced = self
            .sources
            .write()
            .insert(name.to_string(), source)
            .is_some();

        if replaced {
            debug!("Replaced cache stats source: {}", name);
        } else {
            debug!("Registered cache stats source: {}", name);
        }
    }

    /// Remove a stats source. Returns `true` if it was registered.
    #[allow(dead_code)]
    pub fn unregister(&self, name: &str) -> bool {
        self.sources.write().remove(name).is_some()
    }

    /// Check if a source with the given name exists.
    #[allow(dead_code)]
    pub fn contains(&self, name: &str) -> bool {
        self.sources.read().contains_key(name)
    }

    /// Statistics of every registered cache, ordered by name.
    pub fn snapshot(&self) -> BTreeMap<String, CacheStatsSnapshot> {
        self.sources
            .read()
            .iter()
            .map(|(name, source)| (name.clone(), source.stats_snapshot()))
            .collect()
    }

    /// Get a list of all registered cache names.
    pub fn cache_names(&self) -> Vec<String> {
        self.sources.read().keys().cloned().collect()
    }
}

impl std::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheRegistry")
            .field("cache_names", &self.cache_names())
            .finish()
    }
}
