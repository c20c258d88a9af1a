//! File Dependency Module
//!
//! Records a baseline snapshot of a watched file (existence + last-write
//! time) and reports whether the file has since diverged from it.

use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};

// == File Baseline ==
/// Snapshot of a watched file taken when the policy was constructed.
///
/// The baseline survives persistence, so a file change while the cache
/// process is down still expires the item after rehydration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileBaseline {
    /// The watched path
    pub path: PathBuf,
    /// Whether the file existed at capture time
    pub existed: bool,
    /// Last-write time at capture, Unix milliseconds; None if absent or
    /// the platform reports no mtime
    pub modified_ms: Option<i64>,
}

impl FileBaseline {
    // == Capture ==
    /// Records the current state of `path` as the baseline.
    pub fn capture(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let (existed, modified_ms) = Self::stat(&path);
        Self {
            path,
            existed,
            modified_ms,
        }
    }

    // == Has Changed ==
    /// Returns true if the file's current state differs from the baseline:
    /// created, deleted, or rewritten since capture.
    pub fn has_changed(&self) -> bool {
        let (exists, modified_ms) = Self::stat(&self.path);
        exists != self.existed || modified_ms != self.modified_ms
    }

    fn stat(path: &Path) -> (bool, Option<i64>) {
        match std::fs::metadata(path) {
            Ok(meta) => {
                let modified_ms = meta
                    .modified()
                    .ok()
                    .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
                    .map(|d| d.as_millis() as i64);
                (true, modified_ms)
            }
            Err(_) => (false, None),
        }
    }
}
