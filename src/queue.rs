//! The priority message queue and its single consumer: pops the most urgent
//! pending message, runs its workflow, and preempts (cancels and re-queues)
//! an in-flight lower-priority run when a more urgent message arrives.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;

use crate::context::{sanitize_for_log, Priority, WorkflowContext};
use crate::engine::{EngineError, WorkflowEngine};
use crate::error::SchedulerError;

/// One enqueued unit of work: a priority, the name of a registered
/// workflow, and the context to run it with.
pub struct WorkflowMessage {
    pub priority: Priority,
    pub workflow_name: String,
    pub context: WorkflowContext,
    sequence: u64,
}

impl WorkflowMessage {
    fn new(priority: Priority, workflow_name: String, context: WorkflowContext, sequence: u64) -> Self {
        Self {
            priority,
            workflow_name,
            context,
            sequence,
        }
    }
}

// `BinaryHeap` is a max-heap and is not insertion-stable, so `Ord` compares
// `(priority, sequence)` with both reversed: the heap then pops the
// numerically-smallest-priority (most urgent), earliest-enqueued message
// first, giving FIFO order among same-priority messages.
impl Ord for WorkflowMessage {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

impl PartialOrd for WorkflowMessage {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for WorkflowMessage {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.sequence == other.sequence
    }
}

impl Eq for WorkflowMessage {}

/// The in-flight message's priority and the token that cancels its run.
struct InFlight {
    priority: Priority,
    cancel: CancellationToken,
}

/// Priority queue and single-consumer loop over registered workflow engines.
///
/// Preemption window: a message only cancels work that is already running
/// when `publish` checks the in-flight slot. A message that arrives in the
/// gap between the consumer popping the heap and recording the in-flight
/// slot will not preempt that run — this is the documented race window, not
/// a bug. There is no fairness guarantee against starvation: a steady stream
/// of higher-priority arrivals can keep re-preempting lower-priority work
/// indefinitely.
pub struct MessageQueue {
    heap: Mutex<BinaryHeap<WorkflowMessage>>,
    notify: Notify,
    sequence: AtomicU64,
    engines: HashMap<String, Arc<WorkflowEngine>>,
    in_flight: Mutex<Option<InFlight>>,
    preemptive: bool,
    poll_interval: Duration,
    stopped: std::sync::atomic::AtomicBool,
}

impl MessageQueue {
    pub fn new(preemptive: bool) -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::new()),
            notify: Notify::new(),
            sequence: AtomicU64::new(0),
            engines: HashMap::new(),
            in_flight: Mutex::new(None),
            preemptive,
            poll_interval: Duration::from_millis(100),
            stopped: std::sync::atomic::AtomicBool::new(false),
        }
    }

    /// Override the idle-queue re-check interval (default 100ms). The
    /// consumer loop wakes on this interval as a safety net in addition to
    /// being notified immediately whenever a message is published.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Register a workflow's engine under its name, so that the consumer
    /// can look it up at dispatch time.
    pub fn register_workflow(&mut self, name: impl Into<String>, engine: WorkflowEngine) {
        self.engines.insert(name.into(), Arc::new(engine));
    }

    /// Enqueue a message. `workflow_name` is not validated against
    /// registered engines here — an unregistered name is accepted and only
    /// surfaces as a logged warning when the consumer dispatches it (see
    /// `process_message`), matching the spec's dispatch-time
    /// `UnknownWorkflow` handling. If `preemptive` is enabled and the
    /// in-flight run is strictly less urgent than `priority`, its
    /// cancellation token is triggered — the engine observes this at its
    /// next paced yield and writes a `PAUSED` checkpoint rather than
    /// losing progress.
    pub async fn publish(
        &self,
        priority: Priority,
        workflow_name: impl Into<String>,
        context: WorkflowContext,
    ) -> Result<(), SchedulerError> {
        let workflow_name = workflow_name.into();
        let sequence = self.sequence.fetch_add(1, AtomicOrdering::SeqCst);
        let message = WorkflowMessage::new(priority, workflow_name, context, sequence);

        self.heap.lock().await.push(message);
        self.notify.notify_one();

        if self.preemptive {
            let in_flight = self.in_flight.lock().await;
            if let Some(current) = in_flight.as_ref() {
                if priority.is_more_urgent_than(current.priority) {
                    current.cancel.cancel();
                }
            }
        }

        Ok(())
    }

    /// Ask the consumer loop to stop after its current message finishes.
    pub fn stop(&self) {
        self.stopped.store(true, AtomicOrdering::SeqCst);
        self.notify.notify_one();
    }

    fn is_stopped(&self) -> bool {
        self.stopped.load(AtomicOrdering::SeqCst)
    }

    /// Run the single-consumer loop until `stop()` is called: pop the most
    /// urgent message, run its workflow, and either re-queue it (on
    /// cancellation) or drop it (on success or unrecoverable failure).
    pub async fn start_consumer(self: Arc<Self>) {
        loop {
            if self.is_stopped() {
                break;
            }

            let message = {
                let mut heap = self.heap.lock().await;
                heap.pop()
            };

            let Some(message) = message else {
                if self.is_stopped() {
                    break;
                }
                tokio::select! {
                    _ = self.notify.notified() => {}
                    _ = tokio::time::sleep(self.poll_interval) => {}
                }
                continue;
            };

            self.process_message(message).await;
        }
    }

    async fn process_message(&self, message: WorkflowMessage) {
        let WorkflowMessage {
            priority,
            workflow_name,
            context,
            ..
        } = message;

        let sanitized_name = sanitize_for_log(&workflow_name);
        let priority_value = priority.value();
        let Some(engine) = self.engines.get(&workflow_name).cloned() else {
            tracing::warn!(
                "dropping message for unregistered workflow '{sanitized_name}' (priority={priority_value})"
            );
            return;
        };

        let cancel = CancellationToken::new();
        *self.in_flight.lock().await = Some(InFlight {
            priority,
            cancel: cancel.clone(),
        });

        // Keep the original context (and, crucially, its untouched `request`)
        // around so that a cancelled run can be re-enqueued carrying the
        // original request forward, per spec's resume semantics: `data` is
        // restored from the checkpoint on the next `execute`, but `request`
        // is never persisted-and-restored — it survives only because the
        // queue preserves it across re-enqueue.
        let original_context = context.clone();

        match engine.execute(context, 0, &cancel).await {
            Ok(_) => {
                tracing::info!("workflow '{sanitized_name}' completed (priority={priority_value})");
            }
            Err(EngineError::Cancelled { .. }) => {
                tracing::warn!("workflow '{sanitized_name}' preempted, re-queuing (priority={priority_value})");
                let sequence = self.sequence.fetch_add(1, AtomicOrdering::SeqCst);
                let requeued = WorkflowMessage::new(priority, workflow_name, original_context, sequence);
                self.heap.lock().await.push(requeued);
                self.notify.notify_one();
            }
            Err(other) => {
                tracing::error!("workflow '{sanitized_name}' failed (priority={priority_value}): {other}");
            }
        }

        *self.in_flight.lock().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{EngineConfig, Step, WorkflowEngine};
    use crate::storage::{CheckpointStore, MemoryCheckpointStore};

    fn heap_order(priorities: &[Priority]) -> Vec<Priority> {
        let mut heap = BinaryHeap::new();
        for (i, p) in priorities.iter().enumerate() {
            heap.push(WorkflowMessage::new(*p, "wf".to_string(), WorkflowContext::create(HashMap::new()), i as u64));
        }
        let mut order = Vec::new();
        while let Some(m) = heap.pop() {
            order.push(m.priority);
        }
        order
    }

    #[test]
    fn heap_pops_most_urgent_first() {
        let order = heap_order(&[Priority::Low, Priority::High, Priority::Medium]);
        assert_eq!(order, vec![Priority::High, Priority::Medium, Priority::Low]);
    }

    #[test]
    fn heap_breaks_priority_ties_fifo() {
        let order = heap_order(&[Priority::Medium, Priority::Medium, Priority::High]);
        assert_eq!(order, vec![Priority::High, Priority::Medium, Priority::Medium]);
    }

    #[tokio::test]
    async fn publish_to_unregistered_workflow_is_accepted_and_dropped_at_dispatch() {
        // `publish` never validates the workflow name — spec.md's
        // `UnknownWorkflow` surfaces only when the consumer dispatches the
        // message, as a logged warning, and processing continues normally.
        let mut queue = MessageQueue::new(false).with_poll_interval(Duration::from_millis(5));
        let store: Arc<dyn CheckpointStore> = Arc::new(MemoryCheckpointStore::new());
        let completed = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let completed_clone = completed.clone();
        let engine = WorkflowEngine::configure(
            "known",
            vec![Step::new("mark", move |ctx| {
                completed_clone.store(true, AtomicOrdering::SeqCst);
                Ok(ctx)
            })],
            store,
        )
        .with_config(EngineConfig {
            step_pacing: Duration::from_millis(1),
        });
        queue.register_workflow("known", engine);
        let queue = Arc::new(queue);

        queue
            .publish(Priority::High, "ghost", WorkflowContext::create(HashMap::new()))
            .await
            .unwrap();
        queue
            .publish(Priority::Medium, "known", WorkflowContext::create(HashMap::new()))
            .await
            .unwrap();

        let consumer = tokio::spawn(queue.clone().start_consumer());
        tokio::time::sleep(Duration::from_millis(50)).await;
        queue.stop();
        let _ = tokio::time::timeout(Duration::from_millis(200), consumer).await;

        assert!(completed.load(AtomicOrdering::SeqCst));
    }

    #[tokio::test]
    async fn higher_priority_publish_preempts_in_flight_lower_priority_run() {
        let store: Arc<dyn CheckpointStore> = Arc::new(MemoryCheckpointStore::new());
        let slow_engine = WorkflowEngine::configure(
            "slow",
            vec![Step::new("a", |ctx| Ok(ctx)), Step::new("b", |ctx| Ok(ctx))],
            store.clone(),
        )
        .with_config(EngineConfig { step_pacing: Duration::from_secs(30) });

        let mut queue = MessageQueue::new(true);
        queue.register_workflow("slow", slow_engine);
        let queue = Arc::new(queue);

        queue
            .publish(Priority::Low, "slow", WorkflowContext::create(HashMap::new()))
            .await
            .unwrap();

        let consumer = tokio::spawn(queue.clone().start_consumer());
        tokio::time::sleep(Duration::from_millis(20)).await;

        queue
            .publish(Priority::High, "slow", WorkflowContext::create(HashMap::new()))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.stop();
        let _ = tokio::time::timeout(Duration::from_millis(200), consumer).await;
    }
}
