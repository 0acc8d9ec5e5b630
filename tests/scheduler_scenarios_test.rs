//! End-to-end scenarios against the full `MessageQueue` + `WorkflowEngine` +
//! `CheckpointStore` stack: straight-line completion, priority ordering
//! without preemption, preemption-and-resume, a failing step, an unknown
//! workflow name, and two back-to-back same-priority arrivals.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use preemptix::context::{Priority, WorkflowContext};
use preemptix::engine::{EngineConfig, Step, WorkflowEngine};
use preemptix::queue::MessageQueue;
use preemptix::storage::{CheckpointStore, MemoryCheckpointStore};

/// A shared log of `"<label>:<step_index>"` entries, pushed by test steps so
/// scenarios can assert exact interleaving without racing on timers.
#[derive(Clone, Default)]
struct TraceLog(Arc<Mutex<Vec<String>>>);

impl TraceLog {
    fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    fn snapshot(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

/// Build a step that records `"<label>:<index>"` before returning its
/// context unchanged.
fn tracing_step(log: TraceLog, label: &'static str, index: usize) -> Step {
    Step::new(format!("{label}{index}"), move |ctx| {
        log.record(format!("{label}:{index}"));
        Ok(ctx)
    })
}

async fn wait_for<F: Fn() -> bool>(predicate: F, timeout: Duration) {
    let step = Duration::from_millis(2);
    let mut waited = Duration::ZERO;
    while !predicate() && waited < timeout {
        tokio::time::sleep(step).await;
        waited += step;
    }
}

#[tokio::test]
async fn straight_line_completion_runs_all_steps_in_order() {
    // Scenario S1: a single workflow with no competing arrivals runs every
    // step in order and its checkpoint is gone once it completes.
    let log = TraceLog::default();
    let store: Arc<dyn CheckpointStore> = Arc::new(MemoryCheckpointStore::new());
    let steps = (0..3).map(|i| tracing_step(log.clone(), "A", i)).collect();
    let engine = WorkflowEngine::configure("straight-line", steps, store.clone())
        .with_config(EngineConfig { step_pacing: Duration::from_millis(5) });

    let mut queue = MessageQueue::new(true).with_poll_interval(Duration::from_millis(2));
    queue.register_workflow("straight-line", engine);
    let queue = Arc::new(queue);

    let context = WorkflowContext::create(HashMap::new());
    let id = context.id.clone();
    queue.publish(Priority::Medium, "straight-line", context).await.unwrap();

    let consumer = tokio::spawn(queue.clone().start_consumer());
    wait_for(|| log.snapshot().len() == 3, Duration::from_secs(2)).await;
    queue.stop();
    let _ = tokio::time::timeout(Duration::from_millis(200), consumer).await;

    assert_eq!(log.snapshot(), vec!["A:0", "A:1", "A:2"]);
    assert!(store.load(&id).await.unwrap().is_none());
}

#[tokio::test]
async fn priority_queue_without_preemption_honors_priority_then_fifo() {
    // Scenario S2: with preemption disabled, messages published while the
    // queue is idle still dispatch in priority order, and same-priority
    // messages preserve arrival order.
    let log = TraceLog::default();
    let store: Arc<dyn CheckpointStore> = Arc::new(MemoryCheckpointStore::new());
    let engine_config = EngineConfig { step_pacing: Duration::from_millis(1) };

    let mut queue = MessageQueue::new(false).with_poll_interval(Duration::from_millis(2));
    for name in ["low", "medium-1", "medium-2", "high"] {
        let step = tracing_step(log.clone(), name_to_label(name), 0);
        let engine = WorkflowEngine::configure(name, vec![step], store.clone()).with_config(engine_config.clone());
        queue.register_workflow(name, engine);
    }
    let queue = Arc::new(queue);

    // Published out of priority order, before the consumer starts, so all
    // four are sitting on the heap when it first pops.
    queue.publish(Priority::Low, "low", WorkflowContext::create(HashMap::new())).await.unwrap();
    queue.publish(Priority::Medium, "medium-1", WorkflowContext::create(HashMap::new())).await.unwrap();
    queue.publish(Priority::Medium, "medium-2", WorkflowContext::create(HashMap::new())).await.unwrap();
    queue.publish(Priority::High, "high", WorkflowContext::create(HashMap::new())).await.unwrap();

    let consumer = tokio::spawn(queue.clone().start_consumer());
    wait_for(|| log.snapshot().len() == 4, Duration::from_secs(2)).await;
    queue.stop();
    let _ = tokio::time::timeout(Duration::from_millis(200), consumer).await;

    assert_eq!(log.snapshot(), vec!["H", "M1", "M2", "L"]);
}

fn name_to_label(name: &str) -> &'static str {
    match name {
        "low" => "L",
        "medium-1" => "M1",
        "medium-2" => "M2",
        "high" => "H",
        other => panic!("unexpected workflow name in test: {other}"),
    }
}

#[tokio::test]
async fn higher_priority_arrival_preempts_and_the_preempted_run_resumes_to_completion() {
    // Scenario S3: a LOW-priority run is partway through when a HIGH message
    // arrives; preemption pauses it before its next step, the notification
    // runs to completion, and the LOW run resumes at exactly the step it was
    // interrupted on and finishes.
    let log = TraceLog::default();
    let store: Arc<dyn CheckpointStore> = Arc::new(MemoryCheckpointStore::new());
    let pacing = Duration::from_millis(40);

    let low_steps = (0..5).map(|i| tracing_step(log.clone(), "A", i)).collect();
    let low_engine = WorkflowEngine::configure("data-processing", low_steps, store.clone())
        .with_config(EngineConfig { step_pacing: pacing });

    let high_engine = WorkflowEngine::configure("notify", vec![tracing_step(log.clone(), "C", 0)], store.clone())
        .with_config(EngineConfig { step_pacing: pacing });

    let mut queue = MessageQueue::new(true).with_poll_interval(Duration::from_millis(2));
    queue.register_workflow("data-processing", low_engine);
    queue.register_workflow("notify", high_engine);
    let queue = Arc::new(queue);

    queue
        .publish(Priority::Low, "data-processing", WorkflowContext::create(HashMap::new()))
        .await
        .unwrap();

    let consumer = tokio::spawn(queue.clone().start_consumer());

    // Let roughly 2.5 steps elapse, mirroring the spec's scenario timing,
    // then interrupt with the urgent notification.
    tokio::time::sleep(pacing * 5 / 2).await;
    queue
        .publish(Priority::High, "notify", WorkflowContext::create(HashMap::new()))
        .await
        .unwrap();

    wait_for(|| log.snapshot().len() == 6, Duration::from_secs(5)).await;
    queue.stop();
    let _ = tokio::time::timeout(Duration::from_millis(200), consumer).await;

    let trace = log.snapshot();
    assert_eq!(trace, vec!["A:0", "A:1", "C:0", "A:2", "A:3", "A:4"]);
}

#[tokio::test]
async fn failing_step_is_not_requeued_and_leaves_a_failed_checkpoint() {
    // Scenario S4: a step that returns an error ends the run; the failed
    // checkpoint carries the partial `data` but not `request`, and the
    // message is dropped rather than re-queued.
    let store: Arc<dyn CheckpointStore> = Arc::new(MemoryCheckpointStore::new());
    let writes_then_fails = vec![
        Step::new("write", |mut ctx| {
            ctx.data.insert("partial".to_string(), serde_json::Value::from(true));
            Ok(ctx)
        }),
        Step::new("boom", |_ctx| Err(anyhow::anyhow!("disk offline"))),
    ];
    let engine = WorkflowEngine::configure("flaky", writes_then_fails, store.clone())
        .with_config(EngineConfig { step_pacing: Duration::from_millis(2) });

    let mut queue = MessageQueue::new(false).with_poll_interval(Duration::from_millis(2));
    queue.register_workflow("flaky", engine);
    let queue = Arc::new(queue);

    let mut request = HashMap::new();
    request.insert("k".to_string(), serde_json::Value::from("v"));
    let context = WorkflowContext::create(request);
    let id = context.id.clone();
    queue.publish(Priority::Medium, "flaky", context).await.unwrap();

    let consumer = tokio::spawn(queue.clone().start_consumer());
    // Two 2ms-paced steps plus scheduling overhead; generous fixed margin
    // since nothing here races against a second publish.
    tokio::time::sleep(Duration::from_millis(100)).await;
    queue.stop();
    let _ = tokio::time::timeout(Duration::from_millis(200), consumer).await;

    let checkpoint = store.load(&id).await.unwrap().expect("failed checkpoint must persist");
    assert_eq!(checkpoint.current_step, 1);
    assert!(checkpoint.context_data.data.contains_key("partial"));
    assert!(checkpoint.context_data.request.is_empty());
}

#[tokio::test]
async fn publish_to_unknown_workflow_is_logged_and_subsequent_messages_still_process() {
    // Scenario S5: publishing against an unregistered workflow name never
    // errors; the consumer logs it and moves straight on to later messages.
    let log = TraceLog::default();
    let store: Arc<dyn CheckpointStore> = Arc::new(MemoryCheckpointStore::new());
    let engine = WorkflowEngine::configure("known", vec![tracing_step(log.clone(), "K", 0)], store.clone())
        .with_config(EngineConfig { step_pacing: Duration::from_millis(1) });

    let mut queue = MessageQueue::new(false).with_poll_interval(Duration::from_millis(2));
    queue.register_workflow("known", engine);
    let queue = Arc::new(queue);

    queue.publish(Priority::High, "ghost-workflow", WorkflowContext::create(HashMap::new())).await.unwrap();
    queue.publish(Priority::Medium, "known", WorkflowContext::create(HashMap::new())).await.unwrap();

    let consumer = tokio::spawn(queue.clone().start_consumer());
    wait_for(|| log.snapshot().len() == 1, Duration::from_secs(2)).await;
    queue.stop();
    let _ = tokio::time::timeout(Duration::from_millis(200), consumer).await;

    assert_eq!(log.snapshot(), vec!["K:0"]);
}

#[tokio::test]
async fn two_back_to_back_high_priority_arrivals_preserve_fifo_after_preempting_low() {
    // Scenario S6: a LOW run is preempted, then two HIGH messages both sit
    // on the heap; they dispatch in arrival order, and the LOW run resumes
    // only once both have completed.
    let log = TraceLog::default();
    let store: Arc<dyn CheckpointStore> = Arc::new(MemoryCheckpointStore::new());
    let pacing = Duration::from_millis(30);

    let low_steps = (0..3).map(|i| tracing_step(log.clone(), "L", i)).collect();
    let low_engine = WorkflowEngine::configure("long-run", low_steps, store.clone())
        .with_config(EngineConfig { step_pacing: pacing });

    let x_engine = WorkflowEngine::configure("x", vec![tracing_step(log.clone(), "X", 0)], store.clone())
        .with_config(EngineConfig { step_pacing: pacing });
    let y_engine = WorkflowEngine::configure("y", vec![tracing_step(log.clone(), "Y", 0)], store.clone())
        .with_config(EngineConfig { step_pacing: pacing });

    let mut queue = MessageQueue::new(true).with_poll_interval(Duration::from_millis(2));
    queue.register_workflow("long-run", low_engine);
    queue.register_workflow("x", x_engine);
    queue.register_workflow("y", y_engine);
    let queue = Arc::new(queue);

    queue
        .publish(Priority::Low, "long-run", WorkflowContext::create(HashMap::new()))
        .await
        .unwrap();

    let consumer = tokio::spawn(queue.clone().start_consumer());
    tokio::time::sleep(pacing * 3 / 2).await;

    queue.publish(Priority::High, "x", WorkflowContext::create(HashMap::new())).await.unwrap();
    queue.publish(Priority::High, "y", WorkflowContext::create(HashMap::new())).await.unwrap();

    wait_for(|| log.snapshot().len() == 5, Duration::from_secs(5)).await;
    queue.stop();
    let _ = tokio::time::timeout(Duration::from_millis(200), consumer).await;

    assert_eq!(log.snapshot(), vec!["L:0", "X:0", "Y:0", "L:1", "L:2"]);
}
