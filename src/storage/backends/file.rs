//! File-based checkpoint store: one JSON file per workflow id, written
//! atomically via temp-file-then-rename.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::storage::error::{StorageError, StorageResult};
use crate::storage::traits::CheckpointStore;
use crate::storage::types::WorkflowCheckpoint;

/// Checkpoint store that persists each workflow's checkpoint as
/// `<base_dir>/<workflow_id>.json`.
pub struct FileCheckpointStore {
    base_dir: PathBuf,
}

impl FileCheckpointStore {
    /// `base_dir` is created if it does not already exist.
    pub async fn new(base_dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).await?;
        Ok(Self { base_dir })
    }

    fn path_for(&self, workflow_id: &str) -> PathBuf {
        self.base_dir.join(format!("{workflow_id}.json"))
    }

    /// Write `content` to `path` by writing a sibling temp file and
    /// renaming it into place, so a reader never observes a partial write
    /// and a crash mid-write leaves the previous checkpoint intact.
    async fn write_atomic(&self, path: &Path, content: &str) -> StorageResult<()> {
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, content).await?;
        fs::rename(&temp_path, path).await?;
        Ok(())
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointStore {
    async fn save(&self, checkpoint: &WorkflowCheckpoint) -> StorageResult<()> {
        let path = self.path_for(&checkpoint.workflow_id);
        let content = serde_json::to_string_pretty(checkpoint)
            .map_err(StorageError::serialization)?;
        self.write_atomic(&path, &content).await
    }

    async fn load(&self, workflow_id: &str) -> StorageResult<Option<WorkflowCheckpoint>> {
        let path = self.path_for(workflow_id);
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path).await?;
        let checkpoint = serde_json::from_str(&content).map_err(StorageError::serialization)?;
        Ok(Some(checkpoint))
    }

    async fn delete(&self, workflow_id: &str) -> StorageResult<()> {
        let path = self.path_for(workflow_id);
        if path.exists() {
            fs::remove_file(path).await?;
        }
        Ok(())
    }
}
