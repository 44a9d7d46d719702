//! Storage adapter exposing [`KvEngine`] under the [`AsyncStorage`] contract.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use listsync_db::DbRuntimeSettings;

use crate::contract::AsyncStorage;
use crate::engine::KvEngine;
use crate::error::StorageError;
use crate::stats::StorageStats;

/// Backend marker reported by [`SqliteStorage`].
pub const BACKEND_MARKER: &str = "sqlite-async-shim";

/// SQLite-backed [`AsyncStorage`].
///
/// Cloning is cheap and every clone shares the same engine, so the sync
/// client and diagnostics can hold their own handles.
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    engine: Arc<KvEngine>,
}

impl SqliteStorage {
    pub fn new(engine: Arc<KvEngine>) -> Self {
        Self { engine }
    }

    /// Adapter over a lazily opened database file.
    pub fn open(path: impl Into<PathBuf>, settings: DbRuntimeSettings) -> Self {
        Self::new(Arc::new(KvEngine::open_lazy(path, settings)))
    }

    pub fn engine(&self) -> &Arc<KvEngine> {
        &self.engine
    }

    /// Invocation counts since the engine was created.
    pub fn get_stats(&self) -> StorageStats {
        self.engine.stats()
    }
}

#[async_trait]
impl AsyncStorage for SqliteStorage {
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.engine.get(key).await
    }

    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.engine.set(key, value).await
    }

    async fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.engine.remove(key).await
    }

    async fn get_all_keys(&self) -> Result<Vec<String>, StorageError> {
        self.engine.get_all_keys().await
    }

    async fn multi_get(
        &self,
        keys: &[String],
    ) -> Result<Vec<(String, Option<String>)>, StorageError> {
        self.engine.multi_get(keys).await
    }

    async fn multi_set(&self, entries: &[(String, String)]) -> Result<(), StorageError> {
        self.engine.multi_set(entries).await
    }

    async fn multi_remove(&self, keys: &[String]) -> Result<(), StorageError> {
        self.engine.multi_remove(keys).await
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.engine.clear().await
    }

    fn backend(&self) -> &'static str {
        BACKEND_MARKER
    }

    fn stats(&self) -> Option<StorageStats> {
        Some(self.get_stats())
    }
}
