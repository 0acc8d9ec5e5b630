//! The checkpoint store contract.

use async_trait::async_trait;

use super::error::StorageResult;
use super::types::WorkflowCheckpoint;

/// Durable repository for workflow checkpoints.
///
/// Implementations must provide, per `workflow_id`:
/// - `save` overwrites any existing checkpoint and does not return until the
///   write is durable (callers may assume a crash after `save` returns will
///   not lose the checkpoint).
/// - `load` returns `None` for an id with no checkpoint, never an error.
/// - `delete` is idempotent: deleting a missing id is not an error.
///
/// A backend that cannot reach its storage medium returns
/// [`super::error::StorageError::Unavailable`] rather than panicking or
/// silently dropping the write.
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn save(&self, checkpoint: &WorkflowCheckpoint) -> StorageResult<()>;

    async fn load(&self, workflow_id: &str) -> StorageResult<Option<WorkflowCheckpoint>>;

    async fn delete(&self, workflow_id: &str) -> StorageResult<()>;
}
