//! The asynchronous key-value contract consumed by the sync client.

use async_trait::async_trait;

use crate::error::StorageError;
use crate::stats::StorageStats;

/// Bulk asynchronous key-value storage.
///
/// Keys and values are opaque strings. Implementations must be safe to call
/// concurrently: the consumer does not serialize its own storage calls.
///
/// # Example
///
/// ```ignore
/// use listsync_storage::{AsyncStorage, SqliteStorage};
///
/// let storage = SqliteStorage::open("listsync_kv.db", Default::default());
/// storage.set_item("session", "{}").await?;
/// assert_eq!(storage.get_item("session").await?, Some("{}".to_string()));
/// ```
#[async_trait]
pub trait AsyncStorage: Send + Sync + 'static {
    /// Returns the stored value, or `None` if the key is absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Absent keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn remove_item(&self, key: &str) -> Result<(), StorageError>;

    /// Lists every stored key, in no particular order.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn get_all_keys(&self) -> Result<Vec<String>, StorageError>;

    /// Looks up `keys`, returning one pair per input key in input order.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn multi_get(
        &self,
        keys: &[String],
    ) -> Result<Vec<(String, Option<String>)>, StorageError>;

    /// Stores every entry, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails; in that
    /// case none of the entries are stored.
    async fn multi_set(&self, entries: &[(String, String)]) -> Result<(), StorageError>;

    /// Removes every key in `keys`, all or nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn multi_remove(&self, keys: &[String]) -> Result<(), StorageError>;

    /// Removes every record.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying storage operation fails.
    async fn clear(&self) -> Result<(), StorageError>;

    /// Identifies the backend behind this implementation.
    fn backend(&self) -> &'static str;

    /// Per-operation invocation counts, for backends that keep them.
    fn stats(&self) -> Option<StorageStats> {
        None
    }
}
