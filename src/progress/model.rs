//! Progress keys and the boolean map they index.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::store::storage_keys;

/// Which checklist of a record an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressKind {
    /// An action step.
    Step,
    /// A document to prepare.
    Document,
}

impl ProgressKind {
    /// Durable storage key of this kind's map.
    pub fn storage_key(&self) -> &'static str {
        match self {
            Self::Step => storage_keys::STEP_PROGRESS,
            Self::Document => storage_keys::DOCUMENT_PROGRESS,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Step => "step",
            Self::Document => "document",
        }
    }
}

impl fmt::Display for ProgressKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite key: record id, checklist kind, ordinal within the checklist.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProgressKey {
    pub record_id: String,
    pub kind: ProgressKind,
    pub index: usize,
}

impl ProgressKey {
    pub fn new(record_id: impl Into<String>, kind: ProgressKind, index: usize) -> Self {
        Self {
            record_id: record_id.into(),
            kind,
            index,
        }
    }

    /// Stored form: `{id}-{index}` for steps, `{id}-doc-{index}` for documents.
    pub fn encode(&self) -> String {
        match self.kind {
            ProgressKind::Step => format!("{}-{}", self.record_id, self.index),
            ProgressKind::Document => format!("{}-doc-{}", self.record_id, self.index),
        }
    }

    /// Parse a stored key of the given kind. Record ids may contain dashes.
    pub fn decode(kind: ProgressKind, raw: &str) -> Option<Self> {
        let (record_id, index) = match kind {
            ProgressKind::Step => raw.rsplit_once('-')?,
            ProgressKind::Document => raw.rsplit_once("-doc-")?,
        };
        if record_id.is_empty() {
            return None;
        }
        let index = index.parse().ok()?;
        Some(Self::new(record_id, kind, index))
    }
}

impl fmt::Display for ProgressKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Boolean "done" flags for one kind, keyed by encoded [`ProgressKey`].
///
/// Entries are created lazily on first toggle and never removed. Keys that
/// no longer match a record are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProgressMap {
    entries: BTreeMap<String, bool>,
}

impl ProgressMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the flag at `key`. Returns the new value.
    pub fn toggle(&mut self, key: &ProgressKey) -> bool {
        let done = self.entries.entry(key.encode()).or_insert(false);
        *done = !*done;
        *done
    }

    pub fn is_done(&self, key: &ProgressKey) -> bool {
        self.entries.get(&key.encode()).copied().unwrap_or(false)
    }

    /// Number of `true` entries.
    pub fn count_done(&self) -> usize {
        self.entries.values().filter(|done| **done).count()
    }

    /// Number of entries ever created, done or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parsed keys of all `true` entries belonging to `record_id`.
    pub fn done_for_record(&self, kind: ProgressKind, record_id: &str) -> Vec<ProgressKey> {
        self.entries
            .iter()
            .filter(|(_, done)| **done)
            .filter_map(|(raw, _)| ProgressKey::decode(kind, raw))
            .filter(|key| key.record_id == record_id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_encoding_matches_stored_form() {
        assert_eq!(ProgressKey::new("abc", ProgressKind::Step, 2).encode(), "abc-2");
        assert_eq!(
            ProgressKey::new("abc", ProgressKind::Document, 0).encode(),
            "abc-doc-0"
        );
    }

    #[test]
    fn decode_handles_dashed_ids() {
        let id = "6f1c-4b2a-9e0d";
        let key = ProgressKey::decode(ProgressKind::Step, &format!("{id}-3")).unwrap();
        assert_eq!(key.record_id, id);
        assert_eq!(key.index, 3);

        let key = ProgressKey::decode(ProgressKind::Document, &format!("{id}-doc-1")).unwrap();
        assert_eq!(key.record_id, id);
        assert_eq!(key.index, 1);

        assert!(ProgressKey::decode(ProgressKind::Step, "no_index").is_none());
        assert!(ProgressKey::decode(ProgressKind::Step, "-4").is_none());
        assert!(ProgressKey::decode(ProgressKind::Document, "abc-x").is_none());
    }

    #[test]
    fn toggle_is_an_involution() {
        let mut map = ProgressMap::new();
        let key = ProgressKey::new("r1", ProgressKind::Step, 0);
        assert!(!map.is_done(&key));
        assert!(map.toggle(&key));
        assert!(map.is_done(&key));
        assert!(!map.toggle(&key));
        assert!(!map.is_done(&key));
        // Entry stays after toggling back
        assert_eq!(map.len(), 1);
        assert_eq!(map.count_done(), 0);
    }

    #[test]
    fn count_only_true_entries() {
        let mut map = ProgressMap::new();
        map.toggle(&ProgressKey::new("r1", ProgressKind::Step, 0));
        map.toggle(&ProgressKey::new("r2", ProgressKind::Step, 0));
        map.toggle(&ProgressKey::new("r2", ProgressKind::Step, 1));
        map.toggle(&ProgressKey::new("r2", ProgressKind::Step, 1));
        assert_eq!(map.count_done(), 2);
        assert_eq!(map.len(), 3);
        assert_eq!(map.done_for_record(ProgressKind::Step, "r2").len(), 1);
    }

    #[test]
    fn serializes_as_flat_object() {
        let mut map = ProgressMap::new();
        map.toggle(&ProgressKey::new("r1", ProgressKind::Document, 4));
        let json = serde_json::to_value(&map).unwrap();
        assert_eq!(json, serde_json::json!({"r1-doc-4": true}));
    }
}
