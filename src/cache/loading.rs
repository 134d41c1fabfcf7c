//! Read-through cache with refresh-ahead and idle eviction.
//!
//! - Misses call the [`Loader`] once per key; concurrent misses for the same
//!   key wait on that single load.
//! - Entries older than the refresh interval are reloaded on a spawned task
//!   and swapped in when the reload completes. Readers keep getting the old
//!   value meanwhile. A failed reload keeps the old value.
//! - Entries not read within the idle window are dropped. Refreshes do not
//!   count as reads.
//! - `invalidate` wins over any load or refresh that was in flight for the
//!   key when it was called.

use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

use super::{CacheConfig, CacheStats, CacheStatsSnapshot, MIN_INTERVAL, StatsSource};

/// Source of truth behind a [`LoadingCache`].
pub trait Loader<K, V>: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load the current value for `key`.
    fn load(&self, key: &K) -> impl Future<Output = Result<V, Self::Error>> + Send;
}

type LoadResult<V, E> = Result<V, Arc<E>>;
type PendingLoad<V, E> = Arc<OnceCell<LoadResult<V, E>>>;

struct Entry<V> {
    value: V,
    loaded_at: Instant,
    last_read: Instant,
    /// Identifies this incarnation of the entry so late refreshes can't
    /// overwrite a newer load.
    generation: u64,
    refreshing: bool,
}

struct Inner<K, V, L: Loader<K, V>> {
    name: Arc<str>,
    entries: DashMap<K, Entry<V>>,
    pending: DashMap<K, PendingLoad<V, L::Error>>,
    loader: L,
    config: CacheConfig,
    stats: CacheStats,
    generation: AtomicU64,
}

/// A concurrent read-through cache.
///
/// Cloning is cheap and shares the same underlying cache.
pub struct LoadingCache<K, V, L: Loader<K, V>> {
    inner: Arc<Inner<K, V, L>>,
}

impl<K, V, L: Loader<K, V>> Clone for LoadingCache<K, V, L> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K, V, L> LoadingCache<K, V, L>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    L: Loader<K, V>,
{
    /// Create a new cache in front of `loader`.
    pub fn new(name: impl Into<Arc<str>>, loader: L, config: CacheConfig) -> Self {
        let shards = config.shards.max(2).next_power_of_two();

        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                entries: DashMap::with_shard_amount(shards),
                pending: DashMap::with_shard_amount(shards),
                loader,
                config,
                stats: CacheStats::default(),
                generation: AtomicU64::new(0),
            }),
        }
    }

    /// Get the value for `key`, loading it on a miss.
    ///
    /// A hit on an entry past its refresh interval returns the current value
    /// right away and schedules a background reload.
    ///
    /// # Errors
    /// Returns the loader's error if the key was not cached and the load
    /// failed. Every caller that waited on the same load receives it.
    pub async fn get(&self, key: &K) -> Result<V, Arc<L::Error>> {
        let now = Instant::now();

        if let Some((value, refresh_due)) = self.read_entry(key, now) {
            self.inner.stats.record_hit();
            if refresh_due {
                self.refresh(key);
            }
            return Ok(value);
        }

        self.inner.stats.record_miss();
        self.load(key).await
    }

    /// Read a live entry and bump its access time.
    fn read_entry(&self, key: &K, now: Instant) -> Option<(V, bool)> {
        let mut entry = self.inner.entries.get_mut(key)?;

        if self.is_idle(&entry, now) {
            drop(entry);
            self.evict_if_idle(key, now);
            return None;
        }

        entry.last_read = now;
        let refresh_due = self.is_refresh_due(&entry, now);
        Some((entry.value.clone(), refresh_due))
    }

    async fn load(&self, key: &K) -> Result<V, Arc<L::Error>> {
        let pending = self
            .inner
            .pending
            .entry(key.clone())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        pending
            .get_or_init(|| self.load_and_publish(key, &pending))
            .await
            .clone()
    }

    async fn load_and_publish(
        &self,
        key: &K,
        pending: &PendingLoad<V, L::Error>,
    ) -> LoadResult<V, L::Error> {
        debug!("{}: loading {:?}", self.inner.name, key);

        let started = Instant::now();
        let result = self.inner.loader.load(key).await.map_err(Arc::new);
        self.inner.stats.record_load(started.elapsed(), result.is_ok());

        match &result {
            Ok(value) => self.publish(key, pending, value.clone()),
            Err(_) => {
                // Next caller starts a fresh load.
                self.inner
                    .pending
                    .remove_if(key, |_, current| Arc::ptr_eq(current, pending));
            }
        }

        result
    }

    /// Store a freshly loaded value, unless the key was invalidated while
    /// the load was running.
    fn publish(&self, key: &K, pending: &PendingLoad<V, L::Error>, value: V) {
        let Some(current) = self.inner.pending.get(key) else {
            debug!("{}: {:?} invalidated during load, not caching", self.inner.name, key);
            return;
        };
        if !Arc::ptr_eq(current.value(), pending) {
            debug!("{}: {:?} invalidated during load, not caching", self.inner.name, key);
            return;
        }

        // `invalidate` takes the pending lock before touching `entries`, so
        // holding `current` here orders this insert before any later invalidate.
        let now = Instant::now();
        self.inner.entries.insert(
            key.clone(),
            Entry {
                value,
                loaded_at: now,
                last_read: now,
                generation: self.next_generation(),
                refreshing: false,
            },
        );
        drop(current);

        self.inner
            .pending
            .remove_if(key, |_, current| Arc::ptr_eq(current, pending));
    }

    /// Remove the entry for `key`. Does not reload.
    pub fn invalidate(&self, key: &K) {
        // Order matters, see `publish`.
        self.inner.pending.remove(key);
        if self.inner.entries.remove(key).is_some() {
            debug!("{}: invalidated {:?}", self.inner.name, key);
        }
    }

    /// Remove every entry.
    #[allow(dead_code)]
    pub fn invalidate_all(&self) {
        self.inner.pending.clear();
        self.inner.entries.clear();
        debug!("{}: invalidated all entries", self.inner.name);
    }

    /// Check whether a live entry exists, without counting as a read.
    #[allow(dead_code)]
    pub fn contains(&self, key: &K) -> bool {
        let now = Instant::now();
        self.inner
            .entries
            .get(key)
            .is_some_and(|entry| !self.is_idle(&entry, now))
    }

    /// Number of resident entries, including idle ones not yet swept.
    pub fn entry_count(&self) -> u64 {
        self.inner.entries.len() as u64
    }

    /// Schedule a background reload of `key`.
    ///
    /// Returns `false` if the key is absent or a reload is already running.
    pub fn refresh(&self, key: &K) -> bool {
        let generation = {
            let Some(mut entry) = self.inner.entries.get_mut(key) else {
                return false;
            };
            if entry.refreshing {
                return false;
            }
            entry.refreshing = true;
            entry.generation
        };

        let cache = self.clone();
        let key = key.clone();
        tokio::spawn(async move {
            cache.reload(key, generation).await;
        });

        true
    }

    async fn reload(&self, key: K, generation: u64) {
        let started = Instant::now();
        let result = self.inner.loader.load(&key).await;
        self.inner.stats.record_load(started.elapsed(), result.is_ok());
        self.inner.stats.record_refresh(result.is_ok());

        let error = {
            let Some(mut entry) = self.inner.entries.get_mut(&key) else {
                return;
            };
            if entry.generation != generation {
                return;
            }

            entry.refreshing = false;
            match result {
                Ok(value) => {
                    entry.value = value;
                    entry.loaded_at = Instant::now();
                    None
                }
                Err(e) => Some(e),
            }
        };

        match error {
            None => debug!("{}: refreshed {:?}", self.inner.name, key),
            Some(e) => warn!(
                "{}: refresh of {:?} failed, keeping previous value: {}",
                self.inner.name, key, e
            ),
        }
    }

    /// Run one maintenance pass: drop idle entries and schedule reloads for
    /// entries past their refresh interval.
    pub fn run_pending_tasks(&self) {
        let now = Instant::now();

        let mut evicted = 0u64;
        self.inner.entries.retain(|_, entry| {
            let keep = !self.is_idle(entry, now);
            if !keep {
                evicted += 1;
            }
            keep
        });
        if evicted > 0 {
            self.inner.stats.record_evictions(evicted);
            debug!("{}: evicted {} idle entries", self.inner.name, evicted);
        }

        let due: Vec<K> = self
            .inner
            .entries
            .iter()
            .filter(|entry| self.is_refresh_due(entry, now))
            .map(|entry| entry.key().clone())
            .collect();

        for key in &due {
            self.refresh(key);
        }
    }

    /// Start the periodic maintenance task.
    ///
    /// The task runs every refresh interval until the handle is stopped or dropped.
    pub fn spawn_maintenance(&self) -> MaintenanceHandle {
        let cache = self.clone();
        // The fields are public, so the builder clamp may have been bypassed.
        let period = self.inner.config.refresh_interval.max(MIN_INTERVAL);

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                cache.run_pending_tasks();
            }
        });

        debug!("{}: maintenance every {:?}", self.inner.name, period);
        MaintenanceHandle { task }
    }

    /// Current statistics.
    pub fn stats(&self) -> CacheStatsSnapshot {
        self.inner.stats.snapshot(self.entry_count())
    }

    fn evict_if_idle(&self, key: &K, now: Instant) {
        if self
            .inner
            .entries
            .remove_if(key, |_, entry| self.is_idle(entry, now))
            .is_some()
        {
            self.inner.stats.record_evictions(1);
        }
    }

    fn is_idle(&self, entry: &Entry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.last_read) >= self.inner.config.idle_timeout
    }

    fn is_refresh_due(&self, entry: &Entry<V>, now: Instant) -> bool {
        !entry.refreshing
            && now.saturating_duration_since(entry.loaded_at) >= self.inner.config.refresh_interval
    }

    fn next_generation(&self) -> u64 {
        self.inner.generation.fetch_add(1, Ordering::Relaxed)
    }
}

impl<K, V, L> StatsSource for LoadingCache<K, V, L>
where
    K: Hash + Eq + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
    L: Loader<K, V>,
{
    fn stats_snapshot(&self) -> CacheStatsSnapshot {
        self.stats()
    }
}

impl<K, V, L> Debug for LoadingCache<K, V, L>
where
    K: Hash + Eq,
    L: Loader<K, V>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadingCache")
            .field("name", &self.inner.name)
            .field("entry_count", &self.inner.entries.len())
            .finish()
    }
}

/// Handle to a cache's maintenance task. Stops the task when dropped.
#[derive(Debug)]
pub struct MaintenanceHandle {
    task: JoinHandle<()>,
}

impl MaintenanceHandle {
    /// Stop the maintenance task.
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for MaintenanceHandle {
    fn drop(&mut self) {
        self.task.abort();
    }
}
