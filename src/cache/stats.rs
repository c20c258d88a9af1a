//! Cache Statistics Module
//!
//! Tracks cache activity with atomic counters so the read path needs no
//! extra locking, and exposes a plain serializable snapshot.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Stats Counters ==
/// Internal counters, updated concurrently by foreground operations, the
/// scavenger, and hydration.
#[derive(Debug, Default)]
pub(crate) struct StatsCounters {
    hits: AtomicU64,
    misses: AtomicU64,
    expired_removals: AtomicU64,
    capacity_evictions: AtomicU64,
    hydrated_items: AtomicU64,
    hydration_failures: AtomicU64,
}

impl StatsCounters {
    pub(crate) fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_expired_removal(&self) {
        self.expired_removals.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_capacity_eviction(&self) {
        self.capacity_evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_hydrated(&self) {
        self.hydrated_items.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_hydration_failure(&self) {
        self.hydration_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Snapshot the counters alongside the current item count.
    pub(crate) fn snapshot(&self, total_items: usize) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expired_removals: self.expired_removals.load(Ordering::Relaxed),
            capacity_evictions: self.capacity_evictions.load(Ordering::Relaxed),
            hydrated_items: self.hydrated_items.load(Ordering::Relaxed),
            hydration_failures: self.hydration_failures.load(Ordering::Relaxed),
            total_items,
        }
    }
}

// == Cache Stats ==
/// Point-in-time view of cache activity.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Number of successful reads
    pub hits: u64,
    /// Number of reads that found nothing (absent or expired)
    pub misses: u64,
    /// Items removed by the scavenger because a policy fired
    pub expired_removals: u64,
    /// Items evicted by the scavenger under capacity pressure
    pub capacity_evictions: u64,
    /// Items loaded from the backing store at startup
    pub hydrated_items: u64,
    /// Items skipped during hydration (bad payload, decrypt failure)
    pub hydration_failures: u64,
    /// Current number of items in the index
    pub total_items: usize,
}

impl CacheStats {
    /// Calculates the cache hit rate: hits / (hits + misses), or 0.0 when
    /// no reads have happened.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
