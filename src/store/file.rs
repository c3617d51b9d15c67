//! File-backed credential storage.

use std::fs;
use std::io;
use std::path::PathBuf;

use async_trait::async_trait;

use super::{KeyValueStore, StoreError};

/// Directory under the home directory holding the session entries.
const STORE_DIR: &str = ".adspay";

/// Subdirectory for session entries, one file per key.
const SESSION_DIR: &str = "session";

/// Stores each entry as its own file inside a directory.
///
/// Reads are best-effort: a missing or unreadable file is reported as an
/// absent entry, matching the [`KeyValueStore`] contract.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Default entry directory, `~/.adspay/session`.
    ///
    /// Returns `None` if the home directory cannot be determined.
    pub fn default_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(STORE_DIR).join(SESSION_DIR))
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.entry_path(key)).ok()
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if let Err(source) = fs::create_dir_all(&self.dir) {
            return Err(StoreError::Write {
                key: key.to_string(),
                source,
            });
        }
        fs::write(self.entry_path(key), value).map_err(|source| StoreError::Write {
            key: key.to_string(),
            source,
        })
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        match fs::remove_file(self.entry_path(key)) {
            Ok(()) => Ok(()),
            Err(source) if source.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Remove {
                key: key.to_string(),
                source,
            }),
        }
    }
}
