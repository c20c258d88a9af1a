//! Cache Item Module
//!
//! Defines the record held in the index: key, value, expiration policies,
//! scavenging priority, and access metadata, plus the serializable envelope
//! used by the backing stores.

use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::expiration::{any_expired, ExpirationPolicy, ItemState};
use crate::listener::{RemovalCause, RemovalListener};

// == Priority ==
/// Scavenging priority: the tie-break weight when evicting under capacity
/// pressure. Lower priorities are evicted first; `NotRemovable` items are
/// never evicted for capacity but may still expire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Normal,
    High,
    NotRemovable,
}

// == Cache Item ==
/// A single cached item. Items are immutable once published except for the
/// last-accessed timestamp, which is bumped atomically on every read so the
/// hot path only needs the index's read lock.
pub struct CacheItem<V> {
    key: String,
    value: V,
    priority: Priority,
    expirations: Vec<ExpirationPolicy>,
    created_at: DateTime<Utc>,
    last_accessed_ms: AtomicI64,
    on_remove: Option<RemovalListener<V>>,
}

impl<V> CacheItem<V> {
    // == Constructor ==
    /// Creates a new item stamped with the current time.
    pub fn new(
        key: String,
        value: V,
        priority: Priority,
        expirations: Vec<ExpirationPolicy>,
        on_remove: Option<RemovalListener<V>>,
    ) -> Self {
        let now = Utc::now();
        Self {
            key,
            value,
            priority,
            expirations,
            created_at: now,
            last_accessed_ms: AtomicI64::new(now.timestamp_millis()),
            on_remove,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn expirations(&self) -> &[ExpirationPolicy] {
        &self.expirations
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// When the item was last successfully read.
    pub fn last_accessed(&self) -> DateTime<Utc> {
        ms_to_datetime(self.last_accessed_ms.load(Ordering::Acquire))
    }

    pub(crate) fn last_accessed_ms(&self) -> i64 {
        self.last_accessed_ms.load(Ordering::Acquire)
    }

    // == Touch ==
    /// Marks the item as accessed now, resetting any sliding windows.
    pub(crate) fn touch(&self, now: DateTime<Utc>) {
        self.last_accessed_ms
            .store(now.timestamp_millis(), Ordering::Release);
    }

    fn state(&self) -> ItemState {
        ItemState {
            created_at: self.created_at,
            last_accessed: self.last_accessed(),
        }
    }

    // == Is Expired ==
    /// Evaluates all expiration policies against a single `now`; any policy
    /// firing expires the item.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        any_expired(&self.expirations, &self.state(), now)
    }

    // == Removal Notification ==
    /// Invokes the item's removal callback, if one was attached.
    pub(crate) fn notify_removed(&self, cause: RemovalCause) {
        if let Some(listener) = &self.on_remove {
            listener(&self.key, &self.value, cause);
        }
    }
}

impl<V: Serialize> CacheItem<V> {
    /// Serializes the item into the persisted envelope.
    pub(crate) fn to_payload(&self) -> Result<Vec<u8>> {
        let envelope = PersistedItem {
            key: self.key.clone(),
            value: &self.value,
            priority: self.priority,
            expirations: self.expirations.clone(),
            created_at: self.created_at,
            last_accessed_ms: self.last_accessed_ms(),
        };
        Ok(serde_json::to_vec(&envelope)?)
    }
}

impl<V: DeserializeOwned> CacheItem<V> {
    /// Rebuilds an item from a persisted envelope. Removal callbacks are
    /// not persisted, so hydrated items carry none.
    pub(crate) fn from_payload(payload: &[u8]) -> Result<Self> {
        let envelope: OwnedPersistedItem<V> = serde_json::from_slice(payload)?;
        Ok(Self {
            key: envelope.key,
            value: envelope.value,
            priority: envelope.priority,
            expirations: envelope.expirations,
            created_at: envelope.created_at,
            last_accessed_ms: AtomicI64::new(envelope.last_accessed_ms),
            on_remove: None,
        })
    }
}

impl<V: fmt::Debug> fmt::Debug for CacheItem<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheItem")
            .field("key", &self.key)
            .field("value", &self.value)
            .field("priority", &self.priority)
            .field("expirations", &self.expirations.len())
            .field("created_at", &self.created_at)
            .field("last_accessed", &self.last_accessed())
            .field("has_on_remove", &self.on_remove.is_some())
            .finish()
    }
}

// == Persisted Envelope ==
/// Borrowing form used at save time.
#[derive(Serialize)]
struct PersistedItem<'a, V> {
    key: String,
    value: &'a V,
    priority: Priority,
    expirations: Vec<ExpirationPolicy>,
    created_at: DateTime<Utc>,
    last_accessed_ms: i64,
}

/// Owning form used at load time.
#[derive(Deserialize)]
#[serde(bound = "V: DeserializeOwned")]
struct OwnedPersistedItem<V> {
    key: String,
    value: V,
    priority: Priority,
    expirations: Vec<ExpirationPolicy>,
    created_at: DateTime<Utc>,
    last_accessed_ms: i64,
}

// == Utility Functions ==
fn ms_to_datetime(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms)
        .single()
        .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
}
