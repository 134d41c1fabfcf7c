//! Cache configuration.

use std::time::Duration;

/// Lower bound for the refresh interval and idle window.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for a loading cache instance.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Entries older than this are reloaded in the background.
    pub refresh_interval: Duration,

    /// Entries not read within this duration are evicted.
    /// Background refreshes do not count as reads.
    pub idle_timeout: Duration,

    /// Number of independent lock stripes.
    /// Always a power of two greater than one.
    pub shards: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            refresh_interval: Duration::from_secs(60), // 1 minute
            idle_timeout: Duration::from_secs(60),     // 1 minute
            shards: 16,
        }
    }
}

impl CacheConfig {
    /// Create a config striped for the given number of concurrent workers.
    pub fn with_workers(workers: usize) -> Self {
        Self::default().shards(workers)
    }

    /// Set the refresh interval (builder pattern). Clamped to [`MIN_INTERVAL`].
    #[must_use]
    pub fn refresh_interval(mut self, duration: Duration) -> Self {
        self.refresh_interval = duration.max(MIN_INTERVAL);
        self
    }

    /// Set the inactivity window after which unread entries are dropped.
    #[must_use]
    pub fn idle_timeout(mut self, duration: Duration) -> Self {
        self.idle_timeout = duration.max(MIN_INTERVAL);
        self
    }

    /// Size the lock striping for `workers` concurrent accessors.
    ///
    /// The stripe count is rounded up to the next power of two (minimum 2).
    #[must_use]
    pub fn shards(mut self, workers: usize) -> Self {
        self.shards = workers.max(2).next_power_of_two();
        self
    }
}
