//! Versioned blobs on top of `KeyValueStore`.
//!
//! Writes wrap the payload in an [`Envelope`]. Reads accept either an
//! envelope or a bare payload written before envelopes existed. Anything
//! else is discarded with a warning so startup never fails on bad data.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::store::traits::KeyValueStore;

/// Durable storage keys.
pub mod storage_keys {
    pub const USER_PROFILE: &str = "rightlane_user_profile";
    pub const ACTIVE_REPORT: &str = "rightlane_active_report";
    pub const STEP_PROGRESS: &str = "rightlane_progress";
    pub const DOCUMENT_PROGRESS: &str = "rightlane_prepared_docs";
    pub const VISITED: &str = "rightlane_visited";
    pub const THEME: &str = "theme";
}

/// Current envelope format version.
pub const ENVELOPE_VERSION: u32 = 1;

/// A stored payload with its format version and write time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn new(data: T) -> Self {
        Self {
            version: ENVELOPE_VERSION,
            saved_at: Utc::now(),
            data,
        }
    }
}

/// Decode a raw stored value into `T`.
fn decode<T: DeserializeOwned>(key: &str, raw: Value) -> Option<T> {
    let is_envelope = raw
        .as_object()
        .is_some_and(|obj| obj.contains_key("version") && obj.contains_key("data"));

    if is_envelope {
        let envelope: Envelope<Value> = match serde_json::from_value(raw) {
            Ok(env) => env,
            Err(e) => {
                warn!(key, error = %e, "Discarding malformed envelope");
                return None;
            }
        };
        if envelope.version > ENVELOPE_VERSION {
            warn!(
                key,
                version = envelope.version,
                supported = ENVELOPE_VERSION,
                "Discarding blob written by a newer version"
            );
            return None;
        }
        return match serde_json::from_value(envelope.data) {
            Ok(data) => Some(data),
            Err(e) => {
                warn!(key, error = %e, "Discarding stored payload with wrong shape");
                None
            }
        };
    }

    if raw.is_null() {
        warn!(key, "Discarding unreadable stored value");
        return None;
    }

    match serde_json::from_value(raw) {
        Ok(data) => {
            debug!(key, "Read legacy payload without envelope");
            Some(data)
        }
        Err(e) => {
            warn!(key, error = %e, "Discarding legacy payload with wrong shape");
            None
        }
    }
}

/// Read a blob. `None` when absent, unreadable, or the wrong shape.
pub async fn load<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Option<T> {
    match store.get(key).await {
        Ok(Some(raw)) => decode(key, raw),
        Ok(None) => None,
        Err(e) => {
            warn!(key, error = %e, "Storage read failed, using default");
            None
        }
    }
}

/// Read a blob, falling back to `T::default()`.
pub async fn load_or_default<T: DeserializeOwned + Default>(
    store: &dyn KeyValueStore,
    key: &str,
) -> T {
    load(store, key).await.unwrap_or_default()
}

/// Write a blob inside a fresh envelope. Failures are logged, never raised.
pub async fn save<T: Serialize>(store: &dyn KeyValueStore, key: &str, data: &T) {
    let value = match serde_json::to_value(Envelope::new(data)) {
        Ok(v) => v,
        Err(e) => {
            warn!(key, error = %e, "Failed to serialize blob");
            return;
        }
    };
    if let Err(e) = store.set(key, &value).await {
        warn!(key, error = %e, "Failed to persist blob");
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn save_then_load() {
        let store = MemoryStore::new();
        let mut data = BTreeMap::new();
        data.insert("a".to_string(), true);
        save(&store, "k", &data).await;

        let raw = store.get("k").await.unwrap().unwrap();
        assert_eq!(raw["version"], ENVELOPE_VERSION);
        assert_eq!(raw["data"]["a"], true);

        let loaded: BTreeMap<String, bool> = load_or_default(&store, "k").await;
        assert_eq!(loaded, data);
    }

    #[tokio::test]
    async fn legacy_bare_payload_is_accepted() {
        let store = MemoryStore::new();
        store
            .set("k", &serde_json::json!({"rec-0": true, "rec-1": false}))
            .await
            .unwrap();
        let loaded: BTreeMap<String, bool> = load_or_default(&store, "k").await;
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.get("rec-0"), Some(&true));
    }

    #[tokio::test]
    async fn absent_key_gives_default() {
        let store = MemoryStore::new();
        let loaded: Vec<String> = load_or_default(&store, "missing").await;
        assert!(loaded.is_empty());
        assert!(load::<Vec<String>>(&store, "missing").await.is_none());
    }

    #[tokio::test]
    async fn wrong_shape_falls_back() {
        let store = MemoryStore::new();
        store.set("k", &serde_json::json!("not a list")).await.unwrap();
        let loaded: Vec<String> = load_or_default(&store, "k").await;
        assert!(loaded.is_empty());

        store
            .set(
                "k",
                &serde_json::json!({"version": 1, "saved_at": "2024-01-01T00:00:00Z", "data": 42}),
            )
            .await
            .unwrap();
        let loaded: Vec<String> = load_or_default(&store, "k").await;
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn newer_version_is_discarded() {
        let store = MemoryStore::new();
        store
            .set(
                "k",
                &serde_json::json!({"version": 99, "saved_at": "2030-01-01T00:00:00Z", "data": ["x"]}),
            )
            .await
            .unwrap();
        assert!(load::<Vec<String>>(&store, "k").await.is_none());
    }

    #[tokio::test]
    async fn null_value_is_discarded() {
        let store = MemoryStore::new();
        store.set("k", &Value::Null).await.unwrap();
        assert!(load::<Option<String>>(&store, "k").await.is_none());
    }
}
