//! Cache statistics.
//!
//! Plain atomic counters, cheap enough to bump on every read.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use serde::Serialize;

/// Live counters for a single cache.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    load_successes: AtomicU64,
    load_failures: AtomicU64,
    total_load_nanos: AtomicU64,
    evictions: AtomicU64,
    refreshes: AtomicU64,
    refresh_failures: AtomicU64,
}

impl CacheStats {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished load (initial or refresh).
    pub fn record_load(&self, elapsed: Duration, ok: bool) {
        let nanos = u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.total_load_nanos.fetch_add(nanos, Ordering::Relaxed);
        if ok {
            self.load_successes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.load_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_evictions(&self, count: u64) {
        self.evictions.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_refresh(&self, ok: bool) {
        if ok {
            self.refreshes.fetch_add(1, Ordering::Relaxed);
        } else {
            self.refresh_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Take a consistent-enough copy of the counters.
    pub fn snapshot(&self, entry_count: u64) -> CacheStatsSnapshot {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let load_successes = self.load_successes.load(Ordering::Relaxed);
        let load_failures = self.load_failures.load(Ordering::Relaxed);
        let total_load_nanos = self.total_load_nanos.load(Ordering::Relaxed);

        let requests = hits + misses;
        let hit_rate = if requests == 0 {
            0.0
        } else {
            hits as f64 / requests as f64
        };

        let loads = load_successes + load_failures;
        let average_load_millis = if loads == 0 {
            0.0
        } else {
            total_load_nanos as f64 / loads as f64 / 1_000_000.0
        };

        CacheStatsSnapshot {
            hits,
            misses,
            hit_rate,
            load_successes,
            load_failures,
            average_load_millis,
            evictions: self.evictions.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            refresh_failures: self.refresh_failures.load(Ordering::Relaxed),
            entry_count,
        }
    }
}

/// Point-in-time view of [`CacheStats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub load_successes: u64,
    pub load_failures: u64,
    pub average_load_millis: f64,
    pub evictions: u64,
    pub refreshes: u64,
    pub refresh_failures: u64,
    pub entry_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats::default();
        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();

        let snapshot = stats.snapshot(0);
        assert!((snapshot.hit_rate - 0.75).abs() < 0.001);
    }

    #[test]
    fn test_empty_snapshot_has_no_nan() {
        let snapshot = CacheStats::default().snapshot(3);
        assert_eq!(snapshot.hit_rate, 0.0);
        assert_eq!(snapshot.average_load_millis, 0.0);
        assert_eq!(snapshot.entry_count, 3);
    }

    #[test]
    fn test_load_time_average() {
        let stats = CacheStats::default();
        stats.record_load(Duration::from_millis(10), true);
        stats.record_load(Duration::from_millis(30), false);

        let snapshot = stats.snapshot(0);
        assert_eq!(snapshot.load_successes, 1);
        assert_eq!(snapshot.load_failures, 1);
        assert!((snapshot.average_load_millis - 20.0).abs() < 0.001);
    }
}
