//! Schema versioning for the libSQL key-value store.
//!
//! `schema_version` records every applied step. Opening a store applies the
//! steps above the recorded maximum, each inside its own transaction.

use libsql::Connection;

use crate::error::StorageError;

/// `(version, label, sql)`, ascending. Append only.
const STEPS: &[(i64, &str, &str)] = &[(
    1,
    "kv_store",
    "CREATE TABLE IF NOT EXISTS kv_store (
        namespace TEXT NOT NULL,
        key TEXT NOT NULL,
        value TEXT NOT NULL,
        updated_at TEXT NOT NULL DEFAULT (datetime('now')),
        PRIMARY KEY (namespace, key)
    );",
)];

fn migration_error(context: &str, e: impl std::fmt::Display) -> StorageError {
    StorageError::Migration(format!("{context}: {e}"))
}

/// Bring the schema up to the latest version.
pub async fn run_migrations(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            label TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        (),
    )
    .await
    .map_err(|e| migration_error("create schema_version", e))?;

    let applied = schema_version(conn).await?;
    let pending: Vec<_> = STEPS.iter().filter(|(v, _, _)| *v > applied).collect();
    if pending.is_empty() {
        tracing::debug!(version = applied, "Storage schema up to date");
        return Ok(());
    }

    for &(version, label, sql) in pending {
        let tx = conn
            .transaction()
            .await
            .map_err(|e| migration_error("begin", e))?;
        tx.execute_batch(sql)
            .await
            .map_err(|e| migration_error(&format!("apply V{version} {label}"), e))?;
        tx.execute(
            "INSERT INTO schema_version (version, label) VALUES (?1, ?2)",
            libsql::params![version, label],
        )
        .await
        .map_err(|e| migration_error(&format!("record V{version}"), e))?;
        tx.commit()
            .await
            .map_err(|e| migration_error(&format!("commit V{version}"), e))?;
        tracing::info!(version, label, "Storage schema migrated");
    }
    Ok(())
}

/// Highest applied version, 0 on a fresh database.
async fn schema_version(conn: &Connection) -> Result<i64, StorageError> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await
        .map_err(|e| migration_error("read schema_version", e))?;
    let Some(row) = rows
        .next()
        .await
        .map_err(|e| migration_error("read schema_version", e))?
    else {
        return Ok(0);
    };
    row.get::<i64>(0)
        .map_err(|e| migration_error("decode schema_version", e))
}
