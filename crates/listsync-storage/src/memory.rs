//! In-memory [`AsyncStorage`] for tests and platforms without SQLite.
//!
//! Nothing is persisted; the map lives as long as the value.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::contract::AsyncStorage;
use crate::error::StorageError;

/// Backend marker reported by [`MemoryStorage`].
pub const MEMORY_BACKEND_MARKER: &str = "memory";

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    data: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, String>> {
        // No mutation below can leave the map half-updated, so poisoning is ignored.
        self.data.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, String>> {
        self.data.write().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl AsyncStorage for MemoryStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.read().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.write().insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.write().remove(key);
        Ok(())
    }

    async fn get_all_keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self.read().keys().cloned().collect())
    }

    async fn multi_get(
        &self,
        keys: &[String],
    ) -> Result<Vec<(String, Option<String>)>, StorageError> {
        let data = self.read();
        Ok(keys
            .iter()
            .map(|k| (k.clone(), data.get(k).cloned()))
            .collect())
    }

    async fn multi_set(&self, entries: &[(String, String)]) -> Result<(), StorageError> {
        let mut data = self.write();
        for (key, value) in entries {
            data.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn multi_remove(&self, keys: &[String]) -> Result<(), StorageError> {
        let mut data = self.write();
        for key in keys {
            data.remove(key);
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.write().clear();
        Ok(())
    }

    fn backend(&self) -> &'static str {
        MEMORY_BACKEND_MARKER
    }
}
