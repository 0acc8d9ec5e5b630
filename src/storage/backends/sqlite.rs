//! SQLite-backed checkpoint store, behind the `sqlite` feature.
//!
//! Schema mirrors the single-table design in the original Python
//! implementation's `SQLiteCheckpointRepository`: one row per workflow id,
//! upserted in place.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use std::path::Path;
use std::str::FromStr;

use crate::context::{ContextData, WorkflowState};
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::traits::CheckpointStore;
use crate::storage::types::WorkflowCheckpoint;

pub struct SqliteCheckpointStore {
    pool: SqlitePool,
}

impl SqliteCheckpointStore {
    pub async fn new(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let url = format!("sqlite://{}?mode=rwc", db_path.as_ref().display());
        let options = sqlx::sqlite::SqliteConnectOptions::from_str(&url)
            .map_err(|e| StorageError::unavailable(e))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::unavailable(e))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS checkpoints (
                workflow_id TEXT PRIMARY KEY,
                current_step INTEGER NOT NULL,
                state TEXT NOT NULL,
                context_data TEXT NOT NULL,
                metadata TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl CheckpointStore for SqliteCheckpointStore {
    async fn save(&self, checkpoint: &WorkflowCheckpoint) -> StorageResult<()> {
        let state = serde_json::to_string(&checkpoint.state).map_err(StorageError::serialization)?;
        let context_data =
            serde_json::to_string(&checkpoint.context_data).map_err(StorageError::serialization)?;
        let metadata =
            serde_json::to_string(&checkpoint.metadata).map_err(StorageError::serialization)?;

        sqlx::query(
            r#"
            INSERT INTO checkpoints (workflow_id, current_step, state, context_data, metadata, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(workflow_id) DO UPDATE SET
                current_step = excluded.current_step,
                state = excluded.state,
                context_data = excluded.context_data,
                metadata = excluded.metadata,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&checkpoint.workflow_id)
        .bind(checkpoint.current_step as i64)
        .bind(state)
        .bind(context_data)
        .bind(metadata)
        .bind(checkpoint.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        Ok(())
    }

    async fn load(&self, workflow_id: &str) -> StorageResult<Option<WorkflowCheckpoint>> {
        let row = sqlx::query(
            "SELECT current_step, state, context_data, metadata, updated_at FROM checkpoints WHERE workflow_id = ?1",
        )
        .bind(workflow_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Other(e.into()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let current_step: i64 = row.try_get("current_step").map_err(|e| StorageError::Other(e.into()))?;
        let state_json: String = row.try_get("state").map_err(|e| StorageError::Other(e.into()))?;
        let context_json: String = row
            .try_get("context_data")
            .map_err(|e| StorageError::Other(e.into()))?;
        let metadata_json: String = row.try_get("metadata").map_err(|e| StorageError::Other(e.into()))?;
        let updated_at: String = row.try_get("updated_at").map_err(|e| StorageError::Other(e.into()))?;

        let state: WorkflowState = serde_json::from_str(&state_json).map_err(StorageError::serialization)?;
        let context_data: ContextData =
            serde_json::from_str(&context_json).map_err(StorageError::serialization)?;
        let metadata = serde_json::from_str(&metadata_json).map_err(StorageError::serialization)?;
        let updated_at = chrono::DateTime::parse_from_rfc3339(&updated_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now());

        Ok(Some(WorkflowCheckpoint {
            workflow_id: workflow_id.to_string(),
            current_step: current_step as usize,
            state,
            context_data,
            metadata,
            updated_at,
        }))
    }

    async fn delete(&self, workflow_id: &str) -> StorageResult<()> {
        sqlx::query("DELETE FROM checkpoints WHERE workflow_id = ?1")
            .bind(workflow_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Other(e.into()))?;
        Ok(())
    }
}
