//! Error types for the cache engine
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Invalid or missing configuration; fatal at initialization
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid caller input (oversized key, empty key, ...)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Backing store I/O failure during save/remove
    #[error("Persistence failure for key '{key}': {reason}")]
    Persistence { key: String, reason: String },

    /// A single item failed to load or decrypt during hydration
    #[error("Hydration failure for '{key}': {reason}")]
    Hydration { key: String, reason: String },

    /// Encryption provider failure (wrong key, tampered ciphertext)
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Filesystem error from a store adapter
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error for the persisted item envelope
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// SQLite store error
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Internal invariant failure
    #[error("Internal error: {0}")]
    Internal(String),
}

// == Result Type Alias ==
/// Convenience Result type for the cache engine.
pub type Result<T> = std::result::Result<T, CacheError>;
