//! Null Backing Store
//!
//! The non-persistent mode: loads nothing and discards writes, so the
//! manager has a single code path whether or not persistence is enabled.

use async_trait::async_trait;

use crate::error::Result;
use crate::store::{BackingStore, LoadReport};

/// A store that persists nothing. Managers built over it are memory-only
/// and come up empty after a restart.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackingStore;

#[async_trait]
impl BackingStore for NullBackingStore {
    async fn load(&self) -> Result<LoadReport> {
        Ok(LoadReport::default())
    }

    async fn save(&self, _key: &str, _payload: &[u8]) -> Result<()> {
        Ok(())
    }

    async fn remove(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    async fn remove_all(&self) -> Result<()> {
        Ok(())
    }
}
