//! Progress tracker: write-through persistence of both checklists.

use std::sync::Arc;

use tracing::{debug, info};

use super::model::{ProgressKey, ProgressKind, ProgressMap};
use crate::store::{self, KeyValueStore};

/// Durable completion flags for action steps and documents.
///
/// Every toggle persists the whole map of its kind before returning.
pub struct ProgressTracker {
    store: Arc<dyn KeyValueStore>,
    steps: ProgressMap,
    documents: ProgressMap,
}

impl ProgressTracker {
    /// Start with empty maps without reading storage.
    pub fn empty(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            steps: ProgressMap::new(),
            documents: ProgressMap::new(),
        }
    }

    /// Hydrate both maps from storage. Unreadable blobs start empty.
    pub async fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let steps: ProgressMap =
            store::load_or_default(store.as_ref(), ProgressKind::Step.storage_key()).await;
        let documents: ProgressMap =
            store::load_or_default(store.as_ref(), ProgressKind::Document.storage_key()).await;
        info!(
            steps = steps.count_done(),
            documents = documents.count_done(),
            "Progress loaded"
        );
        Self {
            store,
            steps,
            documents,
        }
    }

    fn map(&self, kind: ProgressKind) -> &ProgressMap {
        match kind {
            ProgressKind::Step => &self.steps,
            ProgressKind::Document => &self.documents,
        }
    }

    fn map_mut(&mut self, kind: ProgressKind) -> &mut ProgressMap {
        match kind {
            ProgressKind::Step => &mut self.steps,
            ProgressKind::Document => &mut self.documents,
        }
    }

    /// Flip one flag and persist. Returns the new value.
    pub async fn toggle(&mut self, record_id: &str, kind: ProgressKind, index: usize) -> bool {
        let key = ProgressKey::new(record_id, kind, index);
        let done = self.map_mut(kind).toggle(&key);
        debug!(key = %key, done, "Progress toggled");
        store::save(self.store.as_ref(), kind.storage_key(), self.map(kind)).await;
        done
    }

    pub fn is_done(&self, record_id: &str, kind: ProgressKind, index: usize) -> bool {
        self.map(kind)
            .is_done(&ProgressKey::new(record_id, kind, index))
    }

    /// Completed entries of `kind` across all records.
    pub fn count(&self, kind: ProgressKind) -> usize {
        self.map(kind).count_done()
    }

    /// Completed entries of `kind` for one record.
    pub fn count_for_record(&self, record_id: &str, kind: ProgressKind) -> usize {
        self.map(kind).done_for_record(kind, record_id).len()
    }

    pub fn progress_map(&self, kind: ProgressKind) -> &ProgressMap {
        self.map(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, storage_keys};

    fn memory() -> Arc<dyn KeyValueStore> {
        Arc::new(MemoryStore::new())
    }

    #[tokio::test]
    async fn toggle_twice_restores() {
        let mut tracker = ProgressTracker::empty(memory());
        assert!(!tracker.is_done("r1", ProgressKind::Step, 0));
        assert!(tracker.toggle("r1", ProgressKind::Step, 0).await);
        assert!(tracker.is_done("r1", ProgressKind::Step, 0));
        assert!(!tracker.toggle("r1", ProgressKind::Step, 0).await);
        assert!(!tracker.is_done("r1", ProgressKind::Step, 0));
    }

    #[tokio::test]
    async fn count_across_records() {
        let mut tracker = ProgressTracker::empty(memory());
        tracker.toggle("r1", ProgressKind::Step, 0).await;
        tracker.toggle("r2", ProgressKind::Step, 0).await;
        tracker.toggle("r2", ProgressKind::Document, 0).await;
        assert_eq!(tracker.count(ProgressKind::Step), 2);
        assert_eq!(tracker.count(ProgressKind::Document), 1);
        assert_eq!(tracker.count_for_record("r2", ProgressKind::Step), 1);
    }

    #[tokio::test]
    async fn kinds_are_independent() {
        let mut tracker = ProgressTracker::empty(memory());
        tracker.toggle("r1", ProgressKind::Document, 0).await;
        assert!(!tracker.is_done("r1", ProgressKind::Step, 0));
        assert!(tracker.is_done("r1", ProgressKind::Document, 0));
    }

    #[tokio::test]
    async fn toggles_are_written_through() {
        let store = memory();
        let mut tracker = ProgressTracker::empty(store.clone());
        tracker.toggle("r1", ProgressKind::Step, 1).await;
        tracker.toggle("r1", ProgressKind::Document, 2).await;

        let reloaded = ProgressTracker::load(store.clone()).await;
        assert!(reloaded.is_done("r1", ProgressKind::Step, 1));
        assert!(reloaded.is_done("r1", ProgressKind::Document, 2));

        let raw = store.get(storage_keys::STEP_PROGRESS).await.unwrap().unwrap();
        assert_eq!(raw["data"]["r1-1"], true);
    }

    #[tokio::test]
    async fn legacy_and_broken_blobs() {
        let store = memory();
        store
            .set(
                storage_keys::STEP_PROGRESS,
                &serde_json::json!({"old-record-0": true, "stale-3": false}),
            )
            .await
            .unwrap();
        store
            .set(storage_keys::DOCUMENT_PROGRESS, &serde_json::json!("garbage"))
            .await
            .unwrap();

        let tracker = ProgressTracker::load(store).await;
        assert!(tracker.is_done("old-record", ProgressKind::Step, 0));
        assert_eq!(tracker.count(ProgressKind::Step), 1);
        assert_eq!(tracker.count(ProgressKind::Document), 0);
    }
}
