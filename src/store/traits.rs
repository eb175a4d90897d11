//! `KeyValueStore` trait: the durable local storage boundary.

use async_trait::async_trait;

use crate::error::StorageError;

/// Backend-agnostic durable key-value store.
///
/// Values are JSON blobs. Each store is bound to one namespace (user) at
/// construction.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value. `Ok(None)` when the key was never written.
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError>;

    /// Insert or replace a value.
    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), StorageError>;

    /// Remove a value. Returns whether the key existed.
    async fn delete(&self, key: &str) -> Result<bool, StorageError>;
}
