//! Cache Module
//!
//! The core of the engine: the item record, the concurrent index, the
//! manager façade, and activity statistics.

mod index;
mod item;
pub(crate) mod manager;
mod stats;


// Re-export public types
pub use item::{CacheItem, Priority};
pub use manager::CacheManager;
pub use stats::CacheStats;

pub(crate) use stats::StatsCounters;
