//! The checkpoint store: a durable `save`/`load`/`delete` repository for
//! workflow checkpoints, with interchangeable backends.

pub mod backends;
pub mod config;
pub mod error;
pub mod traits;
pub mod types;

pub use backends::{FileCheckpointStore, MemoryCheckpointStore};
#[cfg(feature = "sqlite")]
pub use backends::SqliteCheckpointStore;
pub use config::{BackendType, StorageConfig};
pub use error::{StorageError, StorageResult};
pub use traits::CheckpointStore;
pub use types::WorkflowCheckpoint;

use std::sync::Arc;

/// Construct the configured [`CheckpointStore`] backend.
pub async fn build_store(config: &StorageConfig) -> StorageResult<Arc<dyn CheckpointStore>> {
    match config.backend {
        BackendType::Memory => Ok(Arc::new(MemoryCheckpointStore::new())),
        BackendType::File => {
            let store = FileCheckpointStore::new(config.base_dir.clone()).await?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "sqlite")]
        BackendType::Sqlite => {
            let db_path = config.base_dir.join("checkpoints.sqlite3");
            let store = SqliteCheckpointStore::new(db_path).await?;
            Ok(Arc::new(store))
        }
    }
}
