//! Backing Store Module
//!
//! The durable persistence contract behind the in-memory index. Adapters
//! store opaque payload blobs keyed by the cache key; the manager owns
//! serialization of items into payloads, so an encryption decorator can sit
//! between the two without either side knowing.

mod encrypted;
mod file;
mod null;
mod sqlite;

pub use encrypted::{AesGcmProvider, EncryptedStore, EncryptionProvider};
pub use file::FileBackingStore;
pub use null::NullBackingStore;
pub use sqlite::SqliteBackingStore;

use async_trait::async_trait;

use crate::error::{CacheError, Result};

// == Load Report ==
/// Result of a full store load at startup. A single unreadable item must
/// not abort hydration, so bad items are reported alongside the good ones.
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Successfully loaded (key, payload) pairs
    pub entries: Vec<(String, Vec<u8>)>,
    /// Items that could not be read or decrypted, with the failure.
    /// The identifier is the cache key where known, or a store-specific
    /// name (such as a file path) when the key itself is unreadable.
    pub failures: Vec<(String, CacheError)>,
}

impl LoadReport {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.failures.is_empty()
    }
}

// == Backing Store Contract ==
/// Capability contract for durable persistence adapters.
///
/// All operations are durable before returning success: a caller may treat
/// a successful `save` as crash-surviving. Adapters must be safe for
/// concurrent calls; the manager additionally serializes mutations behind a
/// single write lock, so store I/O never interleaves for the same key.
#[async_trait]
pub trait BackingStore: Send + Sync {
    /// Loads every persisted item. Called once at startup to hydrate the
    /// index.
    async fn load(&self) -> Result<LoadReport>;

    /// Durably persists the payload under `key`, replacing any previous
    /// payload.
    async fn save(&self, key: &str, payload: &[u8]) -> Result<()>;

    /// Durably removes the payload under `key`. Removing an absent key is
    /// a no-op.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Durably removes every persisted item.
    async fn remove_all(&self) -> Result<()>;
}
