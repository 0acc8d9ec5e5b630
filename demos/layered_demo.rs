//! Runs the layered-architecture walkthrough directly, without going through
//! the CLI: a four-step data-processing workflow, preempted partway through
//! by a single-step urgent notification, resumes and completes once the
//! notification is handled.
//!
//! ```sh
//! cargo run --example layered_demo
//! ```

use std::sync::Arc;

use preemptix::config::SchedulerConfig;
use preemptix::demo::run_layered_demo;
use preemptix::storage::{CheckpointStore, MemoryCheckpointStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let store: Arc<dyn CheckpointStore> = Arc::new(MemoryCheckpointStore::new());
    let config = SchedulerConfig::default();

    run_layered_demo(store, config).await
}
