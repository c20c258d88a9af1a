//! Permacache - A persistent object cache
//!
//! An in-process cache of named items backed by a durable store. Each item
//! carries expiration policies (absolute, sliding, schedule, file change)
//! evaluated uniformly, and a background scavenger reconciles expired items
//! between memory and store while enforcing a maximum item count.
//!
//! # Example
//!
//! ```no_run
//! use permacache::{CacheConfig, CacheManager, ExpirationPolicy, FileBackingStore};
//! use std::time::Duration;
//!
//! # async fn demo() -> permacache::Result<()> {
//! let store = FileBackingStore::open("/var/cache/myapp").await?;
//! let cache: CacheManager<String> =
//!     CacheManager::initialize(CacheConfig::default(), store).await?;
//!
//! cache.add("greeting", "hello".to_string()).await?;
//! assert_eq!(cache.get("greeting").await, Some("hello".to_string()));
//!
//! cache.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod expiration;
pub mod listener;
pub mod store;
mod tasks;

pub use cache::{CacheItem, CacheManager, CacheStats, Priority};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use expiration::{ExpirationPolicy, FileBaseline, ScheduleExpression};
pub use listener::{RemovalCause, RemovalListener};
pub use store::{
    AesGcmProvider, BackingStore, EncryptedStore, EncryptionProvider, FileBackingStore,
    LoadReport, NullBackingStore, SqliteBackingStore,
};
