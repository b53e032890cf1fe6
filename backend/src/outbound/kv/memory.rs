//! In-process key-value store for tests and ephemeral deployments.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::ports::{KeyValueStore, KeyValueStoreError, StoredBlob};

#[derive(Debug, Default)]
struct State {
    entries: HashMap<String, StoredBlob>,
    next_version: u64,
}

impl State {
    fn bump(&mut self) -> u64 {
        self.next_version += 1;
        self.next_version
    }
}

/// Versioned string store held in memory. Contents vanish with the process.
///
/// # Examples
/// ```
/// use budget_portal::domain::ports::KeyValueStore;
/// use budget_portal::outbound::kv::InMemoryKeyValueStore;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let store = InMemoryKeyValueStore::new();
/// let version = store.set("users", "[]".into()).await.expect("write");
/// let blob = store.get("users").await.expect("read").expect("present");
/// assert_eq!(blob.version, version);
/// # });
/// ```
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    state: Mutex<State>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<StoredBlob>, KeyValueStoreError> {
        Ok(self.state.lock().await.entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<u64, KeyValueStoreError> {
        let mut state = self.state.lock().await;
        let version = state.bump();
        state
            .entries
            .insert(key.to_owned(), StoredBlob { value, version });
        Ok(version)
    }

    async fn delete(&self, key: &str) -> Result<(), KeyValueStoreError> {
        self.state.lock().await.entries.remove(key);
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        expected: Option<u64>,
        value: Option<String>,
    ) -> Result<Option<u64>, KeyValueStoreError> {
        let mut state = self.state.lock().await;
        let current = state.entries.get(key).map(|blob| blob.version);
        if current != expected {
            return Err(KeyValueStoreError::version_mismatch(key));
        }
        match value {
            Some(value) => {
                let version = state.bump();
                state
                    .entries
                    .insert(key.to_owned(), StoredBlob { value, version });
                Ok(Some(version))
            }
            None => {
                state.entries.remove(key);
                Ok(None)
            }
        }
    }
}
