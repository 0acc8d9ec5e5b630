//! The layered-architecture demo: five small, domain-agnostic steps
//! (extract/transform/enrich/notify/audit-log), ported from the original
//! `main_layered.py` walkthrough so the scheduler has something real to run
//! end to end. These illustrate the scheduler, not a domain — no
//! e-commerce/ML/healthcare/financial step family is implemented here or
//! anywhere else in this crate.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::config::SchedulerConfig;
use crate::context::{Priority, WorkflowContext};
use crate::engine::{EngineConfig, Step, WorkflowEngine};
use crate::queue::MessageQueue;
use crate::storage::CheckpointStore;

pub fn data_extraction_step() -> Step {
    Step::new("data_extraction", |mut ctx| {
        let user_id = ctx
            .request
            .get("user_id")
            .cloned()
            .unwrap_or_else(|| Value::String("unknown".to_string()));
        ctx.data.insert(
            "extracted_data".to_string(),
            Value::String(format!("user_data_{user_id}")),
        );
        ctx.data
            .insert("extraction_status".to_string(), Value::String("completed".to_string()));
        Ok(ctx)
    })
}

pub fn data_transformation_step() -> Step {
    Step::new("data_transformation", |mut ctx| {
        let raw = ctx
            .data
            .get("extracted_data")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_uppercase();
        ctx.data.insert("transformed_data".to_string(), Value::String(raw));
        ctx.data.insert("validation_passed".to_string(), Value::Bool(true));
        Ok(ctx)
    })
}

pub fn data_enrichment_step() -> Step {
    Step::new("data_enrichment", |mut ctx| {
        let transformed = ctx
            .data
            .get("transformed_data")
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string();
        ctx.data.insert(
            "enriched_data".to_string(),
            Value::String(format!("{transformed}_ENRICHED")),
        );
        ctx.data
            .insert("enrichment_timestamp".to_string(), Value::String("now".to_string()));
        Ok(ctx)
    })
}

pub fn notification_step() -> Step {
    Step::new("notification", |mut ctx| {
        ctx.data.insert("notification_sent".to_string(), Value::Bool(true));
        ctx.data
            .insert("notification_channel".to_string(), Value::String("email".to_string()));
        Ok(ctx)
    })
}

pub fn audit_logging_step() -> Step {
    Step::new("audit_logging", |mut ctx| {
        ctx.data.insert("audit_logged".to_string(), Value::Bool(true));
        ctx.data
            .insert("compliance_status".to_string(), Value::String("compliant".to_string()));
        Ok(ctx)
    })
}

/// Register the `data-processing` (four steps) and `urgent-notification`
/// (one step) demo workflows against `store`, mirroring the layered
/// architecture in `main_layered.py`: a long-running data pipeline that can
/// be preempted by an urgent, single-step alert.
pub fn register_demo_workflows(queue: &mut MessageQueue, store: Arc<dyn CheckpointStore>, engine_config: EngineConfig) {
    let data_processing = WorkflowEngine::configure(
        "data-processing",
        vec![
            data_extraction_step(),
            data_transformation_step(),
            data_enrichment_step(),
            audit_logging_step(),
        ],
        store.clone(),
    )
    .with_config(engine_config.clone());

    let urgent_notification =
        WorkflowEngine::configure("urgent-notification", vec![notification_step()], store)
            .with_config(engine_config);

    queue.register_workflow("data-processing", data_processing);
    queue.register_workflow("urgent-notification", urgent_notification);
}

pub fn data_processing_request() -> HashMap<String, Value> {
    let mut request = HashMap::new();
    request.insert("user_id".to_string(), Value::from(12345));
    request.insert("dataset".to_string(), Value::String("customer_data".to_string()));
    request
}

pub fn urgent_notification_request() -> HashMap<String, Value> {
    let mut request = HashMap::new();
    request.insert("alert_type".to_string(), Value::String("security_breach".to_string()));
    request.insert("severity".to_string(), Value::String("critical".to_string()));
    request
}

/// Run the layered-architecture walkthrough: publish a long LOW-priority
/// data-processing run, let it get partway through, then publish a HIGH
/// urgent notification that preempts it. The data-processing run resumes
/// and completes once the notification has been handled.
pub async fn run_layered_demo(store: Arc<dyn CheckpointStore>, config: SchedulerConfig) -> anyhow::Result<()> {
    let engine_config = EngineConfig {
        step_pacing: config.step_pacing,
    };

    let mut queue = MessageQueue::new(config.preemptive).with_poll_interval(config.poll_interval);
    register_demo_workflows(&mut queue, store, engine_config);
    let queue = Arc::new(queue);

    let consumer = tokio::spawn(queue.clone().start_consumer());

    tracing::info!("starting long data-processing workflow (4 steps)");
    queue
        .publish(
            Priority::Low,
            "data-processing",
            WorkflowContext::create(data_processing_request()),
        )
        .await?;

    // Let the data-processing run complete roughly its first two steps
    // before the urgent notification interrupts it.
    tokio::time::sleep(config.step_pacing * 5 / 2).await;

    tracing::warn!("urgent notification arrived, interrupting data processing");
    queue
        .publish(
            Priority::High,
            "urgent-notification",
            WorkflowContext::create(urgent_notification_request()),
        )
        .await?;

    // Give the notification and the resumed data-processing run time to
    // finish (the remaining steps plus a margin for scheduling overhead).
    tokio::time::sleep(config.step_pacing * 5).await;

    queue.stop();
    let _ = consumer.await;

    tracing::info!("demo complete");
    Ok(())
}
