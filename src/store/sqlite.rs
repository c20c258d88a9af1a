//! SQLite Backing Store
//!
//! Relational storage adapter: one row per item. Runs with WAL journaling
//! and `synchronous=FULL`, so a committed statement survives a crash.
//! Statements are short and the manager already serializes mutations, so
//! the adapter calls rusqlite directly under a connection mutex.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection};

use crate::error::{CacheError, Result};
use crate::store::{BackingStore, LoadReport};

const SCHEMA: &str = "
    PRAGMA journal_mode = WAL;
    PRAGMA synchronous = FULL;
    CREATE TABLE IF NOT EXISTS cache_items (
        cache_key  TEXT PRIMARY KEY,
        payload    BLOB NOT NULL,
        updated_at INTEGER NOT NULL
    );
";

// == SQLite Backing Store ==
pub struct SqliteBackingStore {
    conn: Mutex<Connection>,
}

impl SqliteBackingStore {
    // == Constructor ==
    /// Opens (creating if needed) the database file and ensures the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path.as_ref()).map_err(|e| {
            CacheError::Configuration(format!(
                "cannot open cache database '{}': {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::prepare(conn)
    }

    /// Opens a private in-memory database. Useful for tests; contents do
    /// not survive the process.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| CacheError::Configuration(format!("cannot open in-memory database: {}", e)))?;
        Self::prepare(conn)
    }

    fn prepare(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| CacheError::Internal("cache database mutex poisoned".to_string()))
    }
}

#[async_trait]
impl BackingStore for SqliteBackingStore {
    async fn load(&self) -> Result<LoadReport> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT cache_key, payload FROM cache_items")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
        })?;

        let mut report = LoadReport::default();
        for row in rows {
            report.entries.push(row?);
        }
        Ok(report)
    }

    async fn save(&self, key: &str, payload: &[u8]) -> Result<()> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO cache_items (cache_key, payload, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(cache_key) DO UPDATE SET payload = ?2, updated_at = ?3",
            params![key, payload, Utc::now().timestamp_millis()],
        )?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM cache_items WHERE cache_key = ?1", params![key])?;
        Ok(())
    }

    async fn remove_all(&self) -> Result<()> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM cache_items", [])?;
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_store_save_and_load() {
        let store = SqliteBackingStore::open_in_memory().unwrap();

        store.save("alpha", b"payload-a").await.unwrap();
        store.save("beta", b"payload-b").await.unwrap();

        let mut report = store.load().await.unwrap();
        report.entries.sort();
        assert!(report.failures.is_empty());
        assert_eq!(
            report.entries,
            vec![
                ("alpha".to_string(), b"payload-a".to_vec()),
                ("beta".to_string(), b"payload-b".to_vec()),
            ]
        );
    }

    #[tokio::test]
    async fn test_sqlite_store_upsert() {
        let store = SqliteBackingStore::open_in_memory().unwrap();

        store.save("k", b"v1").await.unwrap();
        store.save("k", b"v2").await.unwrap();

        let report = store.load().await.unwrap();
        assert_eq!(report.entries, vec![("k".to_string(), b"v2".to_vec())]);
    }

    #[tokio::test]
    async fn test_sqlite_store_remove_is_idempotent() {
        let store = SqliteBackingStore::open_in_memory().unwrap();

        store.save("k", b"v").await.unwrap();
        store.remove("k").await.unwrap();
        store.remove("k").await.unwrap();

        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sqlite_store_remove_all() {
        let store = SqliteBackingStore::open_in_memory().unwrap();

        store.save("a", b"1").await.unwrap();
        store.save("b", b"2").await.unwrap();
        store.remove_all().await.unwrap();

        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_sqlite_store_persists_across_connections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cache.db");

        {
            let store = SqliteBackingStore::open(&path).unwrap();
            store.save("k", b"survives").await.unwrap();
        }

        let reopened = SqliteBackingStore::open(&path).unwrap();
        let report = reopened.load().await.unwrap();
        assert_eq!(report.entries, vec![("k".to_string(), b"survives".to_vec())]);
    }
}
