//! # preemptix
//!
//! A priority-preemptive workflow scheduler. Workflow instances are
//! dispatched from a priority min-heap; when a strictly higher-priority
//! instance arrives, any in-flight lower-priority instance is preempted, its
//! progress checkpointed to durable storage, and it is re-enqueued to
//! resume from the step after the one it was interrupted on.
//!
//! Three components do the actual work:
//!
//! - [`storage`] — the `CheckpointStore` contract (`save`/`load`/`delete`)
//!   and its in-memory, file, and (optional) SQLite backends.
//! - [`engine`] — the `WorkflowEngine` that drives a configured step list
//!   against a context, checkpointing before each step and resuming a
//!   paused run from where it left off.
//! - [`queue`] — the priority `MessageQueue` and its single-consumer loop,
//!   which preempts and re-queues in-flight work on a higher-priority
//!   arrival.
//!
//! ## Modules
//!
//! - `context` - `WorkflowContext`, `Priority`, and `WorkflowState`: the
//!   data shared across the engine and the queue
//! - `engine` - the workflow engine (checkpoint-before-step, resume-after-pause)
//! - `queue` - the priority message queue and its consumer loop
//! - `storage` - the checkpoint store contract and its backends
//! - `error` - the unified `SchedulerError` diagnostic type
//! - `config` - scheduler-wide timing and preemption configuration
//! - `demo` - the layered-architecture demo workflows used by the CLI and
//!   the `layered_demo` example
//! - `app` - CLI-facing composition: logging, app configuration, startup
//! - `cli` - the thin `clap`-derived command-line surface

pub mod app;
pub mod cli;
pub mod config;
pub mod context;
pub mod demo;
pub mod engine;
pub mod error;
pub mod queue;
pub mod storage;

pub use config::SchedulerConfig;
pub use context::{Priority, WorkflowContext, WorkflowLogger, WorkflowState};
pub use engine::{EngineConfig, EngineError, Step, WorkflowEngine};
pub use error::SchedulerError;
pub use queue::{MessageQueue, WorkflowMessage};
pub use storage::{CheckpointStore, StorageError, WorkflowCheckpoint};
