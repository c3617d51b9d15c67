//! Persistent credential storage.
//!
//! The [`KeyValueStore`] trait abstracts the underlying persistence so the
//! production file store and the in-memory test store are interchangeable.
//! [`SecureStore`] wraps any of them, obfuscating every value before it is
//! written and treating unreadable entries as absent on the way back out.

mod cipher;
mod file;
mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

/// Credential storage write/remove failures.
///
/// Reads never fail: a missing or unreadable entry is reported as absence.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to write credential entry `{key}`: {source}")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to remove credential entry `{key}`: {source}")]
    Remove {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to obfuscate value for credential entry `{key}`")]
    Obfuscate { key: String },
}

/// Key-value persistence for credential entries.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read an entry. Missing and unreadable entries are both `None`.
    async fn get(&self, key: &str) -> Option<String>;

    /// Write an entry, replacing any previous value.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove an entry. Removing a missing entry is not an error.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}

/// Obfuscating wrapper around a [`KeyValueStore`].
///
/// Values are sealed with the cipher in [`cipher`] before hitting the
/// underlying store. Corrupted entries deobfuscate to `None`, so callers
/// cannot distinguish corruption from absence — by contract, they must not
/// need to. See the module docs of [`cipher`] for what this does and does
/// not protect against.
#[derive(Clone)]
pub struct SecureStore {
    inner: Arc<dyn KeyValueStore>,
}

impl SecureStore {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self { inner }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        let stored = self.inner.get(key).await?;
        match cipher::open(&stored) {
            Some(value) => Some(value),
            None => {
                debug!(key, "discarding unreadable credential entry");
                None
            }
        }
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let sealed = cipher::seal(value).ok_or_else(|| StoreError::Obfuscate {
            key: key.to_string(),
        })?;
        self.inner.set(key, &sealed).await
    }

    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key).await
    }
}
