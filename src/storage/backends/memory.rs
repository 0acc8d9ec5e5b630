//! In-memory checkpoint store, for tests and the in-process demo.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::storage::error::StorageResult;
use crate::storage::traits::CheckpointStore;
use crate::storage::types::WorkflowCheckpoint;

/// Checkpoint store backed by a `tokio::sync::RwLock<HashMap<..>>`.
///
/// Per-key atomicity falls out of the single map being guarded by one lock:
/// two concurrent `save`s for different workflow ids still serialize on the
/// write lock, but neither can observe the other's write half-applied.
#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    checkpoints: RwLock<HashMap<String, WorkflowCheckpoint>>,
}

impl MemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for MemoryCheckpointStore {
    async fn save(&self, checkpoint: &WorkflowCheckpoint) -> StorageResult<()> {
        self.checkpoints
            .write()
            .await
            .insert(checkpoint.workflow_id.clone(), checkpoint.clone());
        Ok(())
    }

    async fn load(&self, workflow_id: &str) -> StorageResult<Option<WorkflowCheckpoint>> {
        Ok(self.checkpoints.read().await.get(workflow_id).cloned())
    }

    async fn delete(&self, workflow_id: &str) -> StorageResult<()> {
        self.checkpoints.write().await.remove(workflow_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{ContextData, WorkflowState};
    use chrono::Utc;
    use std::collections::HashMap as Map;

    fn checkpoint(workflow_id: &str) -> WorkflowCheckpoint {
        WorkflowCheckpoint {
            workflow_id: workflow_id.to_string(),
            current_step: 0,
            state: WorkflowState::Running,
            context_data: ContextData::default(),
            metadata: Map::new(),
            updated_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = MemoryCheckpointStore::new();
        let cp = checkpoint("wf-1");
        store.save(&cp).await.unwrap();

        let loaded = store.load("wf-1").await.unwrap().unwrap();
        assert_eq!(loaded.workflow_id, "wf-1");
    }

    #[tokio::test]
    async fn load_missing_returns_none() {
        let store = MemoryCheckpointStore::new();
        assert!(store.load("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_overwrites_previous_checkpoint_for_same_id() {
        let store = MemoryCheckpointStore::new();
        let mut cp = checkpoint("wf-1");
        store.save(&cp).await.unwrap();

        cp.current_step = 3;
        store.save(&cp).await.unwrap();

        let loaded = store.load("wf-1").await.unwrap().unwrap();
        assert_eq!(loaded.current_step, 3);
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let store = MemoryCheckpointStore::new();
        store.delete("never-existed").await.unwrap();
        store.delete("never-existed").await.unwrap();
    }
}
