//! Cache Manager Module
//!
//! The façade coordinating the index, the backing store, and the scavenger.
//! Construction hydrates the index from the store and starts the scavenger
//! loop; `shutdown` stops it cooperatively.

use std::sync::Arc;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::{watch, Mutex, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::index::CacheIndex;
use crate::cache::{CacheItem, CacheStats, Priority, StatsCounters};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::expiration::ExpirationPolicy;
use crate::listener::{RemovalCause, RemovalListener};
use crate::store::{BackingStore, NullBackingStore};
use crate::tasks::spawn_scavenger_task;

// == Cache Core ==
/// State shared between foreground operations and the scavenger task.
///
/// `write_guard` serializes every store mutation together with its paired
/// index update; store I/O already dominates mutation latency, so one lock
/// is the simple correct choice. Reads never take it.
pub(crate) struct CacheCore<V> {
    pub(crate) config: CacheConfig,
    pub(crate) index: CacheIndex<V>,
    pub(crate) stats: StatsCounters,
    pub(crate) wake: Notify,
    store: Box<dyn BackingStore>,
    write_guard: Mutex<()>,
}

impl<V: Send + Sync + 'static> CacheCore<V> {
    /// Removes a scavenged item: store first, index second, callback last.
    ///
    /// Returns false without touching anything if the key no longer maps to
    /// this exact item (a foreground add replaced it after the snapshot) or
    /// if the store removal failed; a failed item stays indexed and the next
    /// pass retries it.
    pub(crate) async fn scavenge_remove(
        &self,
        item: &Arc<CacheItem<V>>,
        cause: RemovalCause,
    ) -> bool {
        let guard = self.write_guard.lock().await;

        let still_current = match self.index.get(item.key()).await {
            Some(current) => Arc::ptr_eq(&current, item),
            None => false,
        };
        if !still_current {
            return false;
        }

        if let Err(err) = self.store.remove(item.key()).await {
            warn!(key = item.key(), error = %err, "store removal failed, item left for next pass");
            return false;
        }
        self.index.remove_if_same(item.key(), item).await;
        drop(guard);

        item.notify_removed(cause);
        true
    }
}

// == Cache Manager ==
/// A persistent object cache instance.
///
/// Callers hold and pass explicit manager instances; there is no process-wide
/// registry. Values must be serializable so they can round-trip through the
/// backing store.
pub struct CacheManager<V> {
    core: Arc<CacheCore<V>>,
    scavenger: Option<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
}

impl<V> CacheManager<V>
where
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    // == Initialize ==
    /// Creates a manager over the given backing store: validates the
    /// configuration, hydrates the index from `store.load()`, and starts
    /// the scavenger loop.
    ///
    /// A store that cannot load at all is fatal; individual items that fail
    /// to load or deserialize are skipped with a warning.
    pub async fn initialize(config: CacheConfig, store: impl BackingStore + 'static) -> Result<Self> {
        config.validate()?;

        let core = Arc::new(CacheCore {
            config,
            index: CacheIndex::new(),
            stats: StatsCounters::default(),
            wake: Notify::new(),
            store: Box::new(store),
            write_guard: Mutex::new(()),
        });

        // Hydrate the index before the scavenger can observe it
        let report = core.store.load().await?;
        // The identifier is a key where the store could recover one, or a
        // store-side name such as a file path
        for (id, err) in &report.failures {
            warn!(item = %id, error = %err, "skipping item that failed to load");
            core.stats.record_hydration_failure();
        }
        for (key, payload) in report.entries {
            match CacheItem::from_payload(&payload) {
                Ok(item) => {
                    core.index.insert(Arc::new(item)).await;
                    core.stats.record_hydrated();
                }
                Err(err) => {
                    warn!(key = %key, error = %err, "skipping item with undecodable payload");
                    core.stats.record_hydration_failure();
                }
            }
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let scavenger = spawn_scavenger_task(core.clone(), shutdown_rx);

        info!(
            items = core.index.len().await,
            max_items = core.config.max_items,
            interval_secs = core.config.scavenge_interval.as_secs(),
            "cache manager initialized"
        );

        Ok(Self {
            core,
            scavenger: Some(scavenger),
            shutdown_tx,
        })
    }

    /// Creates a memory-only manager with no persistence.
    pub async fn in_memory(config: CacheConfig) -> Result<Self> {
        Self::initialize(config, NullBackingStore).await
    }

    // == Add ==
    /// Adds an item with Normal priority and no expiration policies,
    /// replacing any existing item under the key.
    pub async fn add(&self, key: impl Into<String>, value: V) -> Result<()> {
        self.add_with(key, value, Priority::Normal, Vec::new(), None)
            .await
    }

    /// Adds an item with explicit priority, expiration policies, and an
    /// optional removal callback.
    ///
    /// The item is persisted before it becomes visible to readers; if the
    /// save fails, the add fails as a whole and the index is untouched.
    /// Removal callbacks are not persisted: after a restart, hydrated items
    /// carry none. Overwriting an existing key discards the replaced item's
    /// callback without invoking it; callbacks fire only for removals
    /// (explicit, expiry, or eviction), never for replacement.
    pub async fn add_with(
        &self,
        key: impl Into<String>,
        value: V,
        priority: Priority,
        expirations: Vec<ExpirationPolicy>,
        on_remove: Option<RemovalListener<V>>,
    ) -> Result<()> {
        let key = key.into();
        if key.is_empty() {
            return Err(CacheError::InvalidRequest("key must not be empty".to_string()));
        }
        if key.len() > self.core.config.max_key_length {
            return Err(CacheError::InvalidRequest(format!(
                "key exceeds maximum length of {} bytes",
                self.core.config.max_key_length
            )));
        }

        let item = Arc::new(CacheItem::new(key.clone(), value, priority, expirations, on_remove));
        let payload = item.to_payload()?;

        {
            let _guard = self.core.write_guard.lock().await;
            self.core
                .store
                .save(&key, &payload)
                .await
                .map_err(|err| CacheError::Persistence {
                    key: key.clone(),
                    reason: err.to_string(),
                })?;
            self.core.index.insert(item).await;
        }

        // Signal the scavenger immediately when the add pushed us over
        if self.core.index.len().await > self.core.config.max_items {
            debug!(key = %key, "index over capacity, waking scavenger");
            self.core.wake.notify_one();
        }
        Ok(())
    }

    // == Get ==
    /// Retrieves a value by key, bumping its last-accessed time.
    ///
    /// The store is never consulted here: hydration already populated the
    /// index. An expired item reads as a miss and is left for the scavenger
    /// to remove, keeping the hot path free of I/O.
    pub async fn get(&self, key: &str) -> Option<V> {
        let item = match self.core.index.get(key).await {
            Some(item) => item,
            None => {
                self.core.stats.record_miss();
                return None;
            }
        };

        let now = Utc::now();
        if item.is_expired(now) {
            self.core.stats.record_miss();
            return None;
        }

        item.touch(now);
        self.core.stats.record_hit();
        Some(item.value().clone())
    }

    // == Contains ==
    /// Returns true if a live (non-expired) item exists under the key.
    /// Does not bump the last-accessed time.
    pub async fn contains(&self, key: &str) -> bool {
        match self.core.index.get(key).await {
            Some(item) => !item.is_expired(Utc::now()),
            None => false,
        }
    }

    // == Remove ==
    /// Removes an item from index and store, invoking its removal callback
    /// with `RemovalCause::Explicit`. Returns false if the key was absent;
    /// an absent key is not an error.
    pub async fn remove(&self, key: &str) -> Result<bool> {
        let removed = {
            let _guard = self.core.write_guard.lock().await;
            match self.core.index.get(key).await {
                None => return Ok(false),
                Some(_) => {
                    self.core
                        .store
                        .remove(key)
                        .await
                        .map_err(|err| CacheError::Persistence {
                            key: key.to_string(),
                            reason: err.to_string(),
                        })?;
                    self.core.index.remove(key).await
                }
            }
        };

        if let Some(item) = removed {
            item.notify_removed(RemovalCause::Explicit);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    // == Clear ==
    /// Empties the cache and the backing store. A bulk flush: per-item
    /// removal callbacks are not invoked.
    pub async fn clear(&self) -> Result<()> {
        let _guard = self.core.write_guard.lock().await;
        self.core.store.remove_all().await?;
        let drained = self.core.index.clear().await;
        info!(items = drained.len(), "cache cleared");
        Ok(())
    }

    // == Accessors ==
    /// Current number of items in the index.
    pub async fn count(&self) -> usize {
        self.core.index.len().await
    }

    /// Snapshot of the current keys, not a live view.
    pub async fn keys(&self) -> Vec<String> {
        self.core.index.keys().await
    }

    /// Point-in-time statistics snapshot.
    pub async fn stats(&self) -> CacheStats {
        self.core.stats.snapshot(self.core.index.len().await)
    }

    // == Shutdown ==
    /// Stops the scavenger cooperatively (it finishes its current pass and
    /// does not start another) and releases the backing store. All saves are
    /// synchronous and durable, so there is nothing left to flush.
    pub async fn shutdown(mut self) -> Result<()> {
        let _ = self.shutdown_tx.send(true);
        if let Some(handle) = self.scavenger.take() {
            if let Err(err) = handle.await {
                warn!(error = %err, "scavenger task ended abnormally");
            }
        }
        info!("cache manager shut down");
        Ok(())
    }
}

impl<V> Drop for CacheManager<V> {
    fn drop(&mut self) {
        // A manager dropped without shutdown still stops its scavenger
        if let Some(handle) = self.scavenger.take() {
            let _ = self.shutdown_tx.send(true);
            handle.abort();
        }
    }
}
