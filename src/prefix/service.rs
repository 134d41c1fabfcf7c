//! Prefix resolution and updates.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use super::{CustomPrefix, PrefixUpdate};
use crate::cache::{CacheConfig, CacheRegistry, Loader, LoadingCache, MaintenanceHandle};
use crate::database::{GuildBotId, PrefixStore};
use crate::error::PrefixError;

/// Name the prefix cache reports its statistics under.
pub const PREFIX_CACHE_NAME: &str = "customPrefixes";

/// Loads a chat's prefix from the store for this bot.
pub struct PrefixLoader<S> {
    store: Arc<S>,
    bot_id: i64,
}

impl<S: PrefixStore> Loader<i64, CustomPrefix> for PrefixLoader<S> {
    type Error = PrefixError;

    async fn load(&self, chat_id: &i64) -> Result<CustomPrefix, PrefixError> {
        self.store
            .load_prefix(GuildBotId::new(*chat_id, self.bot_id))
            .await
    }
}

/// Chat id -> custom prefix cache.
pub type PrefixCache<S> = LoadingCache<i64, CustomPrefix, PrefixLoader<S>>;

/// Resolves effective prefixes and applies prefix changes.
///
/// Owns the prefix cache. `start` and `stop` control its background
/// refresh/eviction task.
pub struct PrefixService<S: PrefixStore> {
    store: Arc<S>,
    cache: PrefixCache<S>,
    bot_id: i64,
    default_prefix: String,
    maintenance: Mutex<Option<MaintenanceHandle>>,
}

impl<S: PrefixStore> PrefixService<S> {
    /// Create a service for `bot_id`, falling back to `default_prefix` for
    /// chats without a custom prefix.
    pub fn new(store: Arc<S>, bot_id: i64, default_prefix: impl Into<String>, config: CacheConfig) -> Self {
        let loader = PrefixLoader {
            store: Arc::clone(&store),
            bot_id,
        };

        Self {
            store,
            cache: LoadingCache::new(PREFIX_CACHE_NAME, loader, config),
            bot_id,
            default_prefix: default_prefix.into(),
            maintenance: Mutex::new(None),
        }
    }

    /// Publish cache statistics to `registry`.
    pub fn register_metrics(&self, registry: &CacheRegistry) {
        registry.register(PREFIX_CACHE_NAME, Arc::new(self.cache.clone()));
    }

    /// Start background refresh and eviction. No-op if already running.
    pub fn start(&self) {
        let mut maintenance = self.maintenance.lock();
        if maintenance.is_none() {
            *maintenance = Some(self.cache.spawn_maintenance());
            info!("Prefix cache maintenance started");
        }
    }

    /// Stop background refresh and eviction.
    pub fn stop(&self) {
        if let Some(handle) = self.maintenance.lock().take() {
            handle.stop();
            info!("Prefix cache maintenance stopped");
        }
    }

    pub fn default_prefix(&self) -> &str {
        &self.default_prefix
    }

    #[cfg(test)]
    pub fn cache(&self) -> &PrefixCache<S> {
        &self.cache
    }

    /// The chat's prefix setting, through the cache.
    pub async fn custom_prefix(&self, chat_id: i64) -> Result<CustomPrefix, Arc<PrefixError>> {
        self.cache.get(&chat_id).await
    }

    /// The prefix commands in this chat must start with.
    ///
    /// # Errors
    /// Fails if the prefix wasn't cached and the store couldn't be read.
    /// Callers should not treat that as "no custom prefix".
    pub async fn resolve(&self, chat_id: i64) -> Result<String, Arc<PrefixError>> {
        let custom = self.custom_prefix(chat_id).await?;
        Ok(custom.effective(&self.default_prefix).to_string())
    }

    /// Like [`PrefixService::resolve`], but chats without a group context
    /// (private chats) always get the default prefix.
    pub async fn resolve_for(&self, chat_id: Option<i64>) -> Result<String, Arc<PrefixError>> {
        match chat_id {
            Some(chat_id) => self.resolve(chat_id).await,
            None => Ok(self.default_prefix.clone()),
        }
    }

    /// Write a new prefix setting, then drop the cached one.
    ///
    /// The cache is left untouched if the write fails.
    pub async fn set_prefix(&self, chat_id: i64, update: PrefixUpdate) -> Result<(), PrefixError> {
        let prefix = update.into_custom();
        debug!("Setting prefix for chat {} to {:?}", chat_id, prefix);

        self.store
            .update_prefix(GuildBotId::new(chat_id, self.bot_id), |record| {
                record.set_prefix(&prefix)
            })
            .await?;

        // Invalidate rather than insert: the next read comes from the store.
        self.cache.invalidate(&chat_id);
        Ok(())
    }
}

impl<S: PrefixStore> Drop for PrefixService<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::Ordering;
    use std::time::Duration;

    use futures::future::join_all;

    use crate::database::repository::memory::MemoryPrefixStore;

    const BOT: i64 = 99;

    fn service(store: &MemoryPrefixStore) -> PrefixService<MemoryPrefixStore> {
        PrefixService::new(Arc::new(store.clone()), BOT, "!", CacheConfig::default())
    }

    #[tokio::test]
    async fn test_unknown_chat_gets_default() {
        let store = MemoryPrefixStore::default();
        let prefixes = service(&store);

        assert_eq!(prefixes.resolve(42).await.unwrap(), "!");
        assert_eq!(prefixes.resolve(-1001).await.unwrap(), "!");
    }

    #[tokio::test]
    async fn test_empty_prefix_is_not_default() {
        let store = MemoryPrefixStore::default();
        store.insert(GuildBotId::new(42, BOT), Some(""));
        let prefixes = service(&store);

        assert_eq!(prefixes.resolve(42).await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_other_bots_records_are_ignored() {
        let store = MemoryPrefixStore::default();
        store.insert(GuildBotId::new(42, BOT + 1), Some("?"));
        let prefixes = service(&store);

        assert_eq!(prefixes.resolve(42).await.unwrap(), "!");
    }

    #[tokio::test]
    async fn test_private_chat_skips_cache() {
        let store = MemoryPrefixStore::default();
        let prefixes = service(&store);

        assert_eq!(prefixes.resolve_for(None).await.unwrap(), "!");
        assert_eq!(store.reads(), 0);
        assert_eq!(prefixes.cache().entry_count(), 0);
    }

    #[tokio::test]
    async fn test_scenario_no_prefix_value_reset() {
        let store = MemoryPrefixStore::default();
        let prefixes = service(&store);

        assert_eq!(prefixes.resolve(42).await.unwrap(), "!");

        prefixes.set_prefix(42, PrefixUpdate::parse("no_prefix")).await.unwrap();
        assert_eq!(
            store.stored(GuildBotId::new(42, BOT)).unwrap().prefix.as_deref(),
            Some("")
        );
        assert_eq!(prefixes.resolve(42).await.unwrap(), "");

        prefixes.set_prefix(42, PrefixUpdate::parse("?")).await.unwrap();
        assert_eq!(prefixes.resolve(42).await.unwrap(), "?");

        prefixes.set_prefix(42, PrefixUpdate::parse("reset")).await.unwrap();
        assert_eq!(store.stored(GuildBotId::new(42, BOT)).unwrap().prefix, None);
        assert_eq!(prefixes.resolve(42).await.unwrap(), "!");
    }

    #[tokio::test]
    async fn test_set_prefix_visible_immediately() {
        let store = MemoryPrefixStore::default();
        let prefixes = service(&store);

        assert_eq!(prefixes.resolve(7).await.unwrap(), "!");
        prefixes.set_prefix(7, PrefixUpdate::Set("foo".to_string())).await.unwrap();
        assert_eq!(prefixes.resolve(7).await.unwrap(), "foo");
        assert_eq!(store.reads(), 2);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_cached_value() {
        let store = MemoryPrefixStore::default();
        store.insert(GuildBotId::new(5, BOT), Some("?"));
        let prefixes = service(&store);

        assert_eq!(prefixes.resolve(5).await.unwrap(), "?");
        store.fail_writes.store(true, Ordering::SeqCst);

        let result = prefixes.set_prefix(5, PrefixUpdate::Reset).await;
        assert!(matches!(result, Err(PrefixError::Unavailable(_))));
        assert!(prefixes.cache().contains(&5));
        assert_eq!(prefixes.resolve(5).await.unwrap(), "?");
        assert_eq!(store.reads(), 1);
    }

    #[tokio::test]
    async fn test_store_outage_is_an_error_not_default() {
        let store = MemoryPrefixStore::default();
        store.fail_reads.store(true, Ordering::SeqCst);
        let prefixes = service(&store);

        let err = prefixes.resolve(3).await.unwrap_err();
        assert!(matches!(*err, PrefixError::Unavailable(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_cold_reads_load_once() {
        let store = MemoryPrefixStore::default();
        store.insert(GuildBotId::new(42, BOT), Some("?"));
        let prefixes = service(&store);

        let results = join_all((0..8).map(|_| prefixes.resolve(42))).await;
        assert!(results.into_iter().all(|r| r.unwrap() == "?"));
        assert_eq!(store.reads(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_inactive_chat_is_evicted_then_reloaded() {
        let store = MemoryPrefixStore::default();
        let prefixes = service(&store);

        prefixes.resolve(42).await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(!prefixes.cache().contains(&42));

        assert_eq!(prefixes.resolve(42).await.unwrap(), "!");
        assert_eq!(store.reads(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_and_stop_maintenance() {
        let store = MemoryPrefixStore::default();
        let prefixes = service(&store);
        let registry = CacheRegistry::new();
        prefixes.register_metrics(&registry);

        prefixes.start();
        prefixes.start();
        prefixes.resolve(1).await.unwrap();

        tokio::time::sleep(Duration::from_secs(150)).await;
        assert_eq!(prefixes.cache().entry_count(), 0);
        assert_eq!(registry.snapshot()[PREFIX_CACHE_NAME].evictions, 1);

        prefixes.stop();
        prefixes.stop();
    }
}
