//! libSQL backend: async `KeyValueStore` implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{info, warn};

use crate::error::StorageError;
use crate::store::migrations;
use crate::store::traits::KeyValueStore;

/// libSQL key-value store.
///
/// Stores a single connection that is reused for all operations.
pub struct LibSqlStore {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
    namespace: String,
}

impl LibSqlStore {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path, namespace: &str) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    StorageError::Connection(format!("Failed to create database directory: {e}"))
                })?;
            }
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StorageError::Connection(format!("Failed to open libSQL database: {e}")))?;

        let store = Self::from_database(db, namespace).await?;
        info!(path = %path.display(), namespace, "Storage opened");
        Ok(store)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory(namespace: &str) -> Result<Self, StorageError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                StorageError::Connection(format!("Failed to create in-memory database: {e}"))
            })?;
        Self::from_database(db, namespace).await
    }

    async fn from_database(db: LibSqlDatabase, namespace: &str) -> Result<Self, StorageError> {
        let conn = db
            .connect()
            .map_err(|e| StorageError::Connection(format!("Failed to create connection: {e}")))?;
        migrations::run_migrations(&conn).await?;
        Ok(Self {
            db: Arc::new(db),
            conn,
            namespace: namespace.to_string(),
        })
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

#[async_trait]
impl KeyValueStore for LibSqlStore {
    async fn get(&self, key: &str) -> Result<Option<serde_json::Value>, StorageError> {
        let mut rows = self
            .conn
            .query(
                "SELECT value FROM kv_store WHERE namespace = ?1 AND key = ?2",
                params![self.namespace.as_str(), key],
            )
            .await
            .map_err(|e| StorageError::Query(format!("get: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let value_str: String = row.get(0).unwrap_or_else(|_| "null".to_string());
                // Unparseable text surfaces as Null so readers fall back to defaults.
                let value = serde_json::from_str(&value_str).unwrap_or_else(|e| {
                    warn!(key, error = %e, "Stored value is not valid JSON");
                    serde_json::Value::Null
                });
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(StorageError::Query(format!("get: {e}"))),
        }
    }

    async fn set(&self, key: &str, value: &serde_json::Value) -> Result<(), StorageError> {
        let now = Utc::now().to_rfc3339();
        let value_str =
            serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))?;

        self.conn
            .execute(
                "INSERT INTO kv_store (namespace, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT (namespace, key) DO UPDATE SET value = ?3, updated_at = ?4",
                params![self.namespace.as_str(), key, value_str, now],
            )
            .await
            .map_err(|e| StorageError::Query(format!("set: {e}")))?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, StorageError> {
        let count = self
            .conn
            .execute(
                "DELETE FROM kv_store WHERE namespace = ?1 AND key = ?2",
                params![self.namespace.as_str(), key],
            )
            .await
            .map_err(|e| StorageError::Query(format!("delete: {e}")))?;
        Ok(count > 0)
    }
}
