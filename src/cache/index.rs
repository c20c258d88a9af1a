//! Cache Item Index Module
//!
//! The concurrent in-memory mapping from key to item. Readers share a read
//! lock and never block each other; writers take the write lock for a single
//! key mutation only. Full scans (scavenger, `keys`) work on snapshots, so
//! an item added after a snapshot is simply not considered in that pass.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::cache::CacheItem;

// == Cache Index ==
/// Key-to-item mapping shared between foreground operations and the
/// scavenger. Items are held behind `Arc` so a snapshot stays valid while
/// the live map changes underneath it.
#[derive(Debug)]
pub(crate) struct CacheIndex<V> {
    map: RwLock<HashMap<String, Arc<CacheItem<V>>>>,
}

impl<V> CacheIndex<V> {
    pub(crate) fn new() -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
        }
    }

    // == Insert ==
    /// Publishes an item, returning the previous item under the key if any.
    pub(crate) async fn insert(&self, item: Arc<CacheItem<V>>) -> Option<Arc<CacheItem<V>>> {
        let mut map = self.map.write().await;
        map.insert(item.key().to_string(), item)
    }

    // == Get ==
    pub(crate) async fn get(&self, key: &str) -> Option<Arc<CacheItem<V>>> {
        let map = self.map.read().await;
        map.get(key).cloned()
    }

    // == Remove ==
    pub(crate) async fn remove(&self, key: &str) -> Option<Arc<CacheItem<V>>> {
        let mut map = self.map.write().await;
        map.remove(key)
    }

    /// Removes `key` only if it still maps to the exact item the caller
    /// holds. Protects the scavenger from deleting an item that a foreground
    /// add replaced after the scan snapshot was taken.
    pub(crate) async fn remove_if_same(
        &self,
        key: &str,
        expected: &Arc<CacheItem<V>>,
    ) -> Option<Arc<CacheItem<V>>> {
        let mut map = self.map.write().await;
        match map.get(key) {
            Some(current) if Arc::ptr_eq(current, expected) => map.remove(key),
            _ => None,
        }
    }

    // == Clear ==
    /// Empties the index, returning the removed items.
    pub(crate) async fn clear(&self) -> Vec<Arc<CacheItem<V>>> {
        let mut map = self.map.write().await;
        map.drain().map(|(_, item)| item).collect()
    }

    // == Count ==
    pub(crate) async fn len(&self) -> usize {
        self.map.read().await.len()
    }

    // == Keys ==
    /// Snapshot of current keys, not a live view.
    pub(crate) async fn keys(&self) -> Vec<String> {
        self.map.read().await.keys().cloned().collect()
    }

    // == Snapshot ==
    /// Snapshot of current items for a full scan.
    pub(crate) async fn snapshot(&self) -> Vec<Arc<CacheItem<V>>> {
        self.map.read().await.values().cloned().collect()
    }
}
