//! Scavenger Task
//!
//! Background loop that reconciles expired items between the index and the
//! backing store, then enforces the maximum item count. Woken on a fixed
//! interval, immediately after any add that pushes the index over capacity,
//! and stopped cooperatively at shutdown.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::cache::manager::CacheCore;
use crate::cache::{CacheItem, Priority};
use crate::listener::RemovalCause;

/// Spawns the scavenger loop for a cache manager instance.
///
/// The loop waits on three signals: the scheduled interval, the capacity
/// wake-up, and the shutdown channel. Shutdown is cooperative: a pass that
/// already started finishes, and no new pass begins.
pub(crate) fn spawn_scavenger_task<V: Send + Sync + 'static>(
    core: Arc<CacheCore<V>>,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let interval = core.config.scavenge_interval;
        info!(interval_secs = interval.as_secs(), "scavenger started");

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = core.wake.notified() => {}
                _ = shutdown.changed() => {
                    debug!("scavenger stopping");
                    break;
                }
            }
            run_pass(&core).await;
        }
    })
}

/// One scavenger pass: a single `now` for the whole scan, an expiry sweep,
/// then capacity eviction ordered by (priority ascending, last-accessed
/// ascending), excluding NotRemovable items.
async fn run_pass<V: Send + Sync + 'static>(core: &Arc<CacheCore<V>>) {
    let now = Utc::now();

    // Expiry sweep over a snapshot; items added after the snapshot are
    // simply considered next pass.
    let snapshot = core.index.snapshot().await;
    let mut expired = 0usize;
    for item in snapshot.iter().filter(|item| item.is_expired(now)) {
        if core.scavenge_remove(item, RemovalCause::Expired).await {
            core.stats.record_expired_removal();
            expired += 1;
        }
    }

    // Capacity eviction, one item at a time, re-checking the count after
    // each removal.
    let max_items = core.config.max_items;
    let mut evicted = 0usize;
    if core.index.len().await > max_items {
        let mut candidates: Vec<Arc<CacheItem<V>>> = core
            .index
            .snapshot()
            .await
            .into_iter()
            .filter(|item| item.priority() != Priority::NotRemovable)
            .collect();
        candidates.sort_by_key(|item| (item.priority(), item.last_accessed_ms()));

        for item in candidates {
            if core.index.len().await <= max_items {
                break;
            }
            if core.scavenge_remove(&item, RemovalCause::Capacity).await {
                core.stats.record_capacity_eviction();
                evicted += 1;
            }
        }
    }

    if expired > 0 || evicted > 0 {
        info!(expired, evicted, "scavenger pass removed items");
    } else {
        debug!("scavenger pass found nothing to remove");
    }
}
