//! Removal Notification Module
//!
//! Defines the reason an item left the cache and the callback type invoked
//! when it does.

use std::fmt;
use std::sync::Arc;

// == Removal Cause ==
/// Describes why an item was removed from the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalCause {
    /// The item was removed by an explicit `remove` call
    Explicit,
    /// The item was removed because an expiration policy fired
    Expired,
    /// The item was evicted by the scavenger under capacity pressure
    Capacity,
}

impl fmt::Display for RemovalCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemovalCause::Explicit => write!(f, "explicitly removed"),
            RemovalCause::Expired => write!(f, "expired"),
            RemovalCause::Capacity => write!(f, "scavenged under capacity pressure"),
        }
    }
}

// == Removal Listener ==
/// Callback attached to an item at `add_with` time and invoked with the key,
/// the removed value, and the removal cause.
///
/// Expiration and capacity callbacks run on the scavenger task, never inside
/// a foreground `add` call.
pub type RemovalListener<V> = Arc<dyn Fn(&str, &V, RemovalCause) + Send + Sync>;
