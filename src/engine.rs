//! The workflow engine: runs an ordered list of steps against a
//! [`WorkflowContext`], checkpointing before each step and resuming after a
//! pause.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::context::{sanitize_for_log, WorkflowContext, WorkflowState};
use crate::storage::{CheckpointStore, StorageError, WorkflowCheckpoint};

/// A single named unit of work. The closure receives the current context and
/// returns either the (possibly mutated) context to carry into the next step,
/// or an error describing why the step failed.
#[derive(Clone)]
pub struct Step {
    pub name: String,
    action: Arc<dyn Fn(WorkflowContext) -> Result<WorkflowContext, anyhow::Error> + Send + Sync>,
}

impl Step {
    pub fn new(
        name: impl Into<String>,
        action: impl Fn(WorkflowContext) -> Result<WorkflowContext, anyhow::Error> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            action: Arc::new(action),
        }
    }

    fn run(&self, context: WorkflowContext) -> Result<WorkflowContext, anyhow::Error> {
        (self.action)(context)
    }
}

impl std::fmt::Debug for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Step").field("name", &self.name).finish()
    }
}

/// The three ways a workflow run can end (or be suspended) partway through.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("step {step_index} ('{step_name}') failed: {cause}")]
    StepFailed {
        step_index: usize,
        step_name: String,
        cause: anyhow::Error,
    },

    #[error("workflow execution cancelled at step {step_index}")]
    Cancelled { step_index: usize },

    #[error(transparent)]
    Store(#[from] StorageError),
}

/// Simulated per-step work duration and the cooperative-cancellation poll
/// interval, read once at startup.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub step_pacing: std::time::Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            step_pacing: std::time::Duration::from_secs(2),
        }
    }
}

/// Runs one named workflow's step list against the checkpoint store.
pub struct WorkflowEngine {
    name: String,
    steps: Vec<Step>,
    store: Arc<dyn CheckpointStore>,
    config: EngineConfig,
}

impl WorkflowEngine {
    pub fn configure(name: impl Into<String>, steps: Vec<Step>, store: Arc<dyn CheckpointStore>) -> Self {
        Self {
            name: name.into(),
            steps,
            store,
            config: EngineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run this workflow's steps starting at `start_step`, observing
    /// `cancel` only at the pacing yield between checkpoint-save and
    /// step-invocation.
    ///
    /// If `start_step == 0`, this first performs resume discovery: it loads
    /// any checkpoint for `context.id`, and if one exists with
    /// `state == PAUSED`, overlays its `data` onto `context.data` and starts
    /// from its `current_step` instead of 0. `request` is never restored
    /// from the checkpoint — the caller (the queue) carries the original
    /// request forward by re-enqueuing the original message.
    ///
    /// - A [`StorageError`] from the pre-step checkpoint save propagates
    ///   directly: the caller learns the store is unavailable before any
    ///   step runs.
    /// - A cancellation observed at the paced yield writes a `PAUSED`
    ///   checkpoint with `current_step` pointing at the step that was about
    ///   to run, then returns [`EngineError::Cancelled`].
    /// - A step closure returning `Err` writes a best-effort `FAILED`
    ///   checkpoint (a failure to write it is logged, not propagated) with
    ///   `current_step` at the failed step, then returns
    ///   [`EngineError::StepFailed`].
    /// - Completion deletes the checkpoint and returns the final context.
    pub async fn execute(
        &self,
        mut context: WorkflowContext,
        start_step: usize,
        cancel: &CancellationToken,
    ) -> Result<WorkflowContext, EngineError> {
        let sanitized_name = sanitize_for_log(&self.name);

        let start_step = if start_step == 0 {
            match self.store.load(&context.id).await? {
                Some(checkpoint) if checkpoint.state == WorkflowState::Paused => {
                    context.overlay_checkpoint_data(checkpoint.context_data.data);
                    checkpoint.current_step
                }
                _ => 0,
            }
        } else {
            start_step
        };

        for (index, step) in self.steps.iter().enumerate().skip(start_step) {
            self.checkpoint(
                &context,
                index,
                WorkflowState::Running,
                metadata_for_step(step),
            )
            .await?;

            context.logger.info(
                &context.id,
                &format!("workflow '{sanitized_name}' starting step {index} ('{}')", step.name),
            );

            tokio::select! {
                _ = cancel.cancelled() => {
                    let mut pause_metadata = HashMap::new();
                    pause_metadata.insert(
                        "paused_at_step".to_string(),
                        serde_json::Value::String(step.name.clone()),
                    );
                    self.checkpoint(&context, index, WorkflowState::Paused, pause_metadata)
                        .await?;
                    context.logger.warn(
                        &context.id,
                        &format!("workflow '{sanitized_name}' paused before step {index}"),
                    );
                    return Err(EngineError::Cancelled { step_index: index });
                }
                _ = tokio::time::sleep(self.config.step_pacing) => {}
            }

            let pre_step_context = context.clone();
            context = match step.run(context) {
                Ok(ctx) => ctx,
                Err(cause) => {
                    let mut metadata = HashMap::new();
                    metadata.insert(
                        "error".to_string(),
                        serde_json::Value::String(cause.to_string()),
                    );

                    let fail_checkpoint = WorkflowCheckpoint {
                        workflow_id: pre_step_context.id.clone(),
                        current_step: index,
                        state: WorkflowState::Failed,
                        context_data: pre_step_context.to_context_data_without_request(),
                        metadata,
                        updated_at: Utc::now(),
                    };

                    if let Err(checkpoint_err) = self.store.save(&fail_checkpoint).await {
                        tracing::error!(
                            workflow_id = %pre_step_context.id,
                            "failed to write FAILED checkpoint: {checkpoint_err}"
                        );
                    }

                    return Err(EngineError::StepFailed {
                        step_index: index,
                        step_name: step.name.clone(),
                        cause,
                    });
                }
            };
        }

        self.store.delete(&context.id).await?;
        context.logger.info(
            &context.id,
            &format!("workflow '{sanitized_name}' completed"),
        );

        Ok(context)
    }

    async fn checkpoint(
        &self,
        context: &WorkflowContext,
        current_step: usize,
        state: WorkflowState,
        metadata: HashMap<String, serde_json::Value>,
    ) -> Result<(), EngineError> {
        let checkpoint = WorkflowCheckpoint {
            workflow_id: context.id.clone(),
            current_step,
            state,
            context_data: context.to_context_data(),
            metadata,
            updated_at: Utc::now(),
        };
        self.store.save(&checkpoint).await?;
        Ok(())
    }
}

fn metadata_for_step(step: &Step) -> HashMap<String, serde_json::Value> {
    let mut metadata = HashMap::new();
    metadata.insert(
        "step_name".to_string(),
        serde_json::Value::String(step.name.clone()),
    );
    metadata
}
