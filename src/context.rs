//! The workflow context, priority levels, and execution states that flow
//! between the queue, the engine, and the checkpoint store.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Relative urgency of a queued workflow. Lower numeric value is more urgent;
/// `Ord` follows declaration order so `High < Medium < Low` holds for both
/// the enum's derived comparison and the priority queue's heap ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High = 1,
    Medium = 2,
    Low = 3,
}

impl Priority {
    /// The numeric urgency value from spec.md §6's wire values
    /// (`HIGH=1, MEDIUM=2, LOW=3`), used in the consumer's log lines.
    pub fn value(self) -> u8 {
        self as u8
    }

    /// Whether `self` is strictly more urgent than `other` — the condition
    /// the preemptive consumer uses to decide whether a new arrival should
    /// cancel the in-flight workflow.
    pub fn is_more_urgent_than(self, other: Priority) -> bool {
        self < other
    }
}

/// Lifecycle state of a workflow instance, persisted verbatim in its
/// checkpoint's `state` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowState {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
}

/// Observational sink for workflow progress. Never persisted — a fresh
/// logger is attached whenever a context is rehydrated from a checkpoint.
pub trait WorkflowLogger: Send + Sync {
    fn info(&self, workflow_id: &str, message: &str);
    fn warn(&self, workflow_id: &str, message: &str);
    fn error(&self, workflow_id: &str, message: &str);
}

/// Default logger, backed by `tracing`.
#[derive(Debug, Default)]
pub struct TracingLogger;

impl WorkflowLogger for TracingLogger {
    fn info(&self, workflow_id: &str, message: &str) {
        tracing::info!(workflow_id, "{message}");
    }

    fn warn(&self, workflow_id: &str, message: &str) {
        tracing::warn!(workflow_id, "{message}");
    }

    fn error(&self, workflow_id: &str, message: &str) {
        tracing::error!(workflow_id, "{message}");
    }
}

/// The JSON-serializable portion of a [`WorkflowContext`] — what actually
/// survives a checkpoint round-trip.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ContextData {
    /// Mutable working state. The engine may update this between steps.
    #[serde(default)]
    pub data: HashMap<String, Value>,
    /// The original request that started the workflow. The engine never
    /// mutates this; it is restored as-is on resume.
    #[serde(default)]
    pub request: HashMap<String, Value>,
}

/// Per-instance state threaded through every step of a workflow run.
///
/// `id` is stable across pause/resume: the engine never mints a new one for
/// an existing run, only `WorkflowContext::create` does, for a brand new
/// instance.
#[derive(Clone)]
pub struct WorkflowContext {
    pub id: String,
    pub data: HashMap<String, Value>,
    pub request: HashMap<String, Value>,
    pub logger: Arc<dyn WorkflowLogger>,
}

impl WorkflowContext {
    /// Start a brand new workflow instance with a freshly minted id.
    pub fn create(request: HashMap<String, Value>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            data: HashMap::new(),
            request,
            logger: Arc::new(TracingLogger),
        }
    }

    /// Attach a non-default logger (e.g. one that forwards to a publisher's
    /// own sink).
    pub fn with_logger(mut self, logger: Arc<dyn WorkflowLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// The serializable snapshot of `data`/`request`, as persisted in a
    /// checkpoint.
    pub fn to_context_data(&self) -> ContextData {
        ContextData {
            data: self.data.clone(),
            request: self.request.clone(),
        }
    }

    /// The snapshot persisted in a `FAILED` checkpoint, which per spec
    /// carries only `data` — `request` is omitted rather than restored on a
    /// (non-existent) resume from a failed run.
    pub fn to_context_data_without_request(&self) -> ContextData {
        ContextData {
            data: self.data.clone(),
            request: HashMap::new(),
        }
    }

    /// Overlay a checkpoint's `data` onto this context's `data`, key-wise —
    /// stored values win on key collision, keys absent from the checkpoint
    /// are left as-is. `request` is untouched: the queue carries the
    /// original request forward across preemption by re-enqueuing the
    /// original message, not by restoring it from the checkpoint.
    pub fn overlay_checkpoint_data(&mut self, data: HashMap<String, Value>) {
        self.data.extend(data);
    }
}

impl std::fmt::Debug for WorkflowContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowContext")
            .field("id", &self.id)
            .field("data", &self.data)
            .field("request", &self.request)
            .finish()
    }
}

/// Strip control characters that would let untrusted workflow names corrupt
/// log output (spec's "sanitized workflow name").
pub fn sanitize_for_log(value: &str) -> String {
    value.chars().filter(|c| *c != '\n' && *c != '\r').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_ordering_matches_urgency() {
        assert!(Priority::High < Priority::Medium);
        assert!(Priority::Medium < Priority::Low);
        assert!(Priority::High.is_more_urgent_than(Priority::Low));
        assert!(!Priority::Low.is_more_urgent_than(Priority::High));
    }

    #[test]
    fn context_round_trips_through_context_data() {
        let mut request = HashMap::new();
        request.insert("order_id".to_string(), Value::String("o-1".to_string()));
        let mut ctx = WorkflowContext::create(request.clone());
        ctx.data.insert("step".to_string(), Value::from(2));

        let snapshot = ctx.to_context_data();
        let mut restored = WorkflowContext::create(HashMap::new());
        restored.id = ctx.id.clone();
        restored.overlay_checkpoint_data(snapshot.data);

        assert_eq!(restored.id, ctx.id);
        // `request` is never restored from a checkpoint snapshot.
        assert!(restored.request.is_empty());
        assert_eq!(restored.data.get("step"), Some(&Value::from(2)));
    }

    #[test]
    fn overlay_checkpoint_data_keeps_keys_absent_from_the_checkpoint() {
        let mut ctx = WorkflowContext::create(HashMap::new());
        ctx.data.insert("kept".to_string(), Value::from(1));

        let mut incoming = HashMap::new();
        incoming.insert("kept".to_string(), Value::from(99));
        incoming.insert("new".to_string(), Value::from("x"));
        ctx.overlay_checkpoint_data(incoming);

        assert_eq!(ctx.data.get("kept"), Some(&Value::from(99)));
        assert_eq!(ctx.data.get("new"), Some(&Value::from("x")));
    }

    #[test]
    fn sanitize_strips_newlines_and_carriage_returns() {
        assert_eq!(sanitize_for_log("wf\nname\r"), "wfname");
    }
}
