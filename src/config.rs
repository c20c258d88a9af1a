//! Configuration Module
//!
//! Holds the tunable knobs of a cache manager instance. Stores and
//! encryption providers are injected at construction, not configured here.

use std::env;
use std::time::Duration;

use crate::error::{CacheError, Result};

/// Cache manager configuration parameters.
///
/// All values can be loaded from environment variables with sensible defaults,
/// or set directly on the struct before calling `CacheManager::initialize`.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Maximum number of items the index may hold before the scavenger
    /// starts evicting under capacity pressure
    pub max_items: usize,
    /// Interval between scheduled scavenger passes
    pub scavenge_interval: Duration,
    /// Maximum allowed key length in bytes
    pub max_key_length: usize,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `PERMACACHE_MAX_ITEMS` - Maximum cache items (default: 1000)
    /// - `PERMACACHE_SCAVENGE_INTERVAL` - Scavenger interval in seconds (default: 1)
    /// - `PERMACACHE_MAX_KEY_LENGTH` - Maximum key length in bytes (default: 256)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_items: env::var("PERMACACHE_MAX_ITEMS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_items),
            scavenge_interval: env::var("PERMACACHE_SCAVENGE_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.scavenge_interval),
            max_key_length: env::var("PERMACACHE_MAX_KEY_LENGTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_key_length),
        }
    }

    /// Validates the configuration, returning a Configuration error on
    /// values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.max_items == 0 {
            return Err(CacheError::Configuration(
                "max_items must be greater than zero".to_string(),
            ));
        }
        if self.scavenge_interval.is_zero() {
            return Err(CacheError::Configuration(
                "scavenge_interval must be greater than zero".to_string(),
            ));
        }
        if self.max_key_length == 0 {
            return Err(CacheError::Configuration(
                "max_key_length must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_items: 1000,
            scavenge_interval: Duration::from_secs(1),
            max_key_length: 256,
        }
    }
}
