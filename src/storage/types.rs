//! The checkpoint data model and its supporting query types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::context::{ContextData, WorkflowState};

/// A durable snapshot of a paused, failed, or in-flight workflow instance.
///
/// Exactly one checkpoint exists per `workflow_id` at any time: every save
/// overwrites the previous one for that id, and a `COMPLETED` run deletes it
/// rather than persisting a final snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowCheckpoint {
    pub workflow_id: String,
    /// Meaning depends on `state`: the step about to run (`Running`), the
    /// step to resume at (`Paused`), or the step that failed (`Failed`).
    pub current_step: usize,
    pub state: WorkflowState,
    pub context_data: ContextData,
    /// Free-form metadata, e.g. `{"step_name": "..."}` or `{"error": "..."}`.
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    pub updated_at: DateTime<Utc>,
}
