//! File Backing Store
//!
//! One file per item inside a dedicated directory. File names are the hex
//! SHA-256 of the cache key, so arbitrary keys never produce hostile paths;
//! the record inside the file carries the original key plus the payload.
//! Writes go to a sibling temp file, are fsynced, then renamed over the
//! final name so readers never observe a torn item.

use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use async_trait::async_trait;
use tracing::warn;

use crate::error::{CacheError, Result};
use crate::store::{BackingStore, LoadReport};

/// Extension of finished item files.
const ITEM_EXTENSION: &str = "cache";
/// Extension of in-flight writes; ignored at load time and swept on open.
const TEMP_EXTENSION: &str = "tmp";

// == Stored Record ==
/// On-disk JSON record. The payload is base64 because it may be ciphertext.
#[derive(Serialize, Deserialize)]
struct StoredRecord {
    key: String,
    payload: String,
}

// == File Backing Store ==
/// Isolated per-directory file storage adapter.
#[derive(Debug, Clone)]
pub struct FileBackingStore {
    dir: PathBuf,
}

impl FileBackingStore {
    // == Constructor ==
    /// Opens (creating if needed) the storage directory.
    pub async fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).await.map_err(|e| {
            CacheError::Configuration(format!(
                "cannot open file store directory '{}': {}",
                dir.display(),
                e
            ))
        })?;

        // Temp files are leftovers from a save interrupted mid-write;
        // they would otherwise accumulate forever
        let mut entries = fs::read_dir(&dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(TEMP_EXTENSION) {
                warn!(file = %path.display(), "removing stale temp file");
                fs::remove_file(&path).await?;
            }
        }

        Ok(Self { dir })
    }

    /// The storage directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn item_path(&self, key: &str) -> PathBuf {
        let digest = Sha256::digest(key.as_bytes());
        self.dir
            .join(hex::encode(digest))
            .with_extension(ITEM_EXTENSION)
    }

    async fn read_record(path: &Path) -> Result<(String, Vec<u8>)> {
        let bytes = fs::read(path).await?;
        let record: StoredRecord = serde_json::from_slice(&bytes)?;
        let payload = BASE64.decode(record.payload.as_bytes()).map_err(|e| {
            CacheError::Hydration {
                key: record.key.clone(),
                reason: format!("invalid payload encoding: {}", e),
            }
        })?;
        Ok((record.key, payload))
    }
}

#[async_trait]
impl BackingStore for FileBackingStore {
    async fn load(&self) -> Result<LoadReport> {
        let mut report = LoadReport::default();
        let mut dir = fs::read_dir(&self.dir).await?;

        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ITEM_EXTENSION) {
                continue;
            }
            match Self::read_record(&path).await {
                Ok((key, payload)) => report.entries.push((key, payload)),
                Err(err) => {
                    // A bad file must not abort hydration of the others.
                    // File names are digests, so the cache key may be
                    // unrecoverable; the failure is reported by path.
                    warn!(file = %path.display(), error = %err, "skipping unreadable item file");
                    report.failures.push((path.display().to_string(), err));
                }
            }
        }
        Ok(report)
    }

    async fn save(&self, key: &str, payload: &[u8]) -> Result<()> {
        let record = StoredRecord {
            key: key.to_string(),
            payload: BASE64.encode(payload),
        };
        let bytes = serde_json::to_vec(&record)?;

        let final_path = self.item_path(key);
        let tmp_path = final_path.with_extension(TEMP_EXTENSION);

        let mut file = fs::File::create(&tmp_path).await?;
        file.write_all(&bytes).await?;
        file.sync_all().await?;
        drop(file);

        fs::rename(&tmp_path, &final_path).await?;
        // The directory entry must also reach the disk: without this a
        // crash right after the rename can lose a freshly created item
        fs::File::open(&self.dir).await?.sync_all().await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.item_path(key)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn remove_all(&self) -> Result<()> {
        let mut dir = fs::read_dir(&self.dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) == Some(ITEM_EXTENSION) {
                fs::remove_file(&path).await?;
            }
        }
        Ok(())
    }
}
