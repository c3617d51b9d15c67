//! In-memory credential storage for tests.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{KeyValueStore, StoreError};

/// Test double storing entries in a shared map, with a toggle to make
/// writes fail.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `set` calls fail, to exercise error paths.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn entry_count(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Write {
                key: key.to_string(),
                source: io::Error::new(io::ErrorKind::Other, "writes disabled"),
            });
        }
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn behaves_like_a_store() {
        let store = MemoryStore::new();
        assert!(store.get("k").await.is_none());

        store.set("k", "v").await.unwrap();
        assert_eq!(store.get("k").await.as_deref(), Some("v"));
        assert_eq!(store.entry_count(), 1);

        store.remove("k").await.unwrap();
        assert!(store.get("k").await.is_none());
    }

    #[tokio::test]
    async fn clones_share_the_same_entries() {
        let store = MemoryStore::new();
        let alias = store.clone();

        store.set("k", "v").await.unwrap();
        assert_eq!(alias.get("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn write_failures_can_be_forced() {
        let store = MemoryStore::new();
        store.set_fail_writes(true);
        assert!(store.set("k", "v").await.is_err());

        store.set_fail_writes(false);
        assert!(store.set("k", "v").await.is_ok());
    }
}
