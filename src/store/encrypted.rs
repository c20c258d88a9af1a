//! Encrypted Store Decorator
//!
//! Wraps any backing store with encryption-at-rest: payloads are encrypted
//! before they reach the underlying adapter and decrypted on the way out.
//! A payload that fails to decrypt (rotated key, tampered ciphertext) is
//! reported as a per-item load failure; it never aborts hydration of the
//! other items.

use std::fmt;

use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, Key, KeyInit};
use async_trait::async_trait;
use rand::RngCore;

use crate::error::{CacheError, Result};
use crate::store::{BackingStore, LoadReport};

/// AES-GCM nonce size in bytes.
const NONCE_LEN: usize = 12;
/// AES-GCM authentication tag size in bytes.
const TAG_LEN: usize = 16;

// == Encryption Provider Contract ==
/// Symmetric encryption capability for payload blobs. Key material comes
/// from the caller's secret mechanism; the cache engine never holds raw
/// key configuration.
pub trait EncryptionProvider: Send + Sync {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>>;
    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>>;
}

// == AES-GCM Provider ==
/// AES-256-GCM provider. Each encryption uses a fresh random 12-byte nonce,
/// prepended to the ciphertext.
pub struct AesGcmProvider {
    cipher: Aes256Gcm,
}

impl AesGcmProvider {
    pub fn new(key: &[u8; 32]) -> Self {
        Self {
            cipher: Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key)),
        }
    }
}

impl fmt::Debug for AesGcmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesGcmProvider").finish_non_exhaustive()
    }
}

impl EncryptionProvider for AesGcmProvider {
    fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let mut nonce = vec![0u8; NONCE_LEN];
        rand::rng().fill_bytes(&mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(GenericArray::from_slice(&nonce), plaintext)
            .map_err(|_| CacheError::Encryption("payload encryption failed".to_string()))?;

        let mut out = nonce;
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> Result<Vec<u8>> {
        if ciphertext.len() < NONCE_LEN + TAG_LEN {
            return Err(CacheError::Encryption(
                "encrypted payload too short".to_string(),
            ));
        }
        let (nonce, body) = ciphertext.split_at(NONCE_LEN);
        self.cipher
            .decrypt(GenericArray::from_slice(nonce), body)
            .map_err(|_| {
                CacheError::Encryption(
                    "payload decryption failed (wrong key or tampered data)".to_string(),
                )
            })
    }
}

// == Encrypted Store ==
/// Decorator adding encryption-at-rest to any `BackingStore`.
pub struct EncryptedStore {
    inner: Box<dyn BackingStore>,
    provider: Box<dyn EncryptionProvider>,
}

impl EncryptedStore {
    pub fn new(
        inner: impl BackingStore + 'static,
        provider: impl EncryptionProvider + 'static,
    ) -> Self {
        Self {
            inner: Box::new(inner),
            provider: Box::new(provider),
        }
    }
}

impl fmt::Debug for EncryptedStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl BackingStore for EncryptedStore {
    async fn load(&self) -> Result<LoadReport> {
        let raw = self.inner.load().await?;
        let mut report = LoadReport {
            entries: Vec::with_capacity(raw.entries.len()),
            failures: raw.failures,
        };

        for (key, ciphertext) in raw.entries {
            match self.provider.decrypt(&ciphertext) {
                Ok(plaintext) => report.entries.push((key, plaintext)),
                Err(err) => report.failures.push((
                    key.clone(),
                    CacheError::Hydration {
                        key,
                        reason: err.to_string(),
                    },
                )),
            }
        }
        Ok(report)
    }

    async fn save(&self, key: &str, payload: &[u8]) -> Result<()> {
        let ciphertext = self.provider.encrypt(payload)?;
        self.inner.save(key, &ciphertext).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.inner.remove(key).await
    }

    async fn remove_all(&self) -> Result<()> {
        self.inner.remove_all().await
    }
}
