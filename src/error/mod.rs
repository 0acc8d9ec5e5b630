//! # Scheduler Error System
//!
//! A unified error type, [`SchedulerError`], for diagnostics at the CLI/demo
//! boundary. Subsystems that need to be matched on programmatically — the
//! checkpoint store and the workflow engine — have their own small
//! `thiserror` enums ([`crate::storage::error::StorageError`],
//! [`crate::engine::EngineError`]); `SchedulerError` wraps those for
//! human-facing reporting rather than replacing them.
//!
//! ## Context chaining
//!
//! Add `.context(...)` at effect boundaries (I/O, store calls, step
//! invocation) to build a readable chain:
//!
//! ```rust
//! use preemptix::error::{SchedulerError, ErrorExt};
//!
//! fn load_config(path: &str) -> Result<String, SchedulerError> {
//!     std::fs::read_to_string(path)
//!         .to_other_error("failed to read scheduler config")
//! }
//! ```

use std::sync::Arc;
use thiserror::Error;

pub mod codes;
pub mod helpers;
pub mod serialization;

pub use codes::{describe_error_code, ErrorCode};
pub use helpers::{common, ErrorExt};
pub use serialization::SerializableError;

/// One entry in an error's context chain.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub message: String,
    pub location: Option<&'static str>,
}

/// Unified diagnostic error type for the scheduler CLI and demos.
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("[E{code:04}] checkpoint store error: {message}")]
    Store {
        code: u16,
        message: String,
        workflow_id: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: Vec<ErrorContext>,
        error_source: Option<Arc<SchedulerError>>,
    },

    #[error("[E{code:04}] workflow engine error: {message}")]
    Engine {
        code: u16,
        message: String,
        workflow_name: Option<String>,
        step_index: Option<usize>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: Vec<ErrorContext>,
        error_source: Option<Arc<SchedulerError>>,
    },

    #[error("[E{code:04}] queue error: {message}")]
    Queue {
        code: u16,
        message: String,
        workflow_name: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: Vec<ErrorContext>,
        error_source: Option<Arc<SchedulerError>>,
    },

    #[error("[E{code:04}] {message}")]
    Other {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: Vec<ErrorContext>,
        error_source: Option<Arc<SchedulerError>>,
    },
}

impl SchedulerError {
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            code: ErrorCode::STORE_GENERIC,
            message: message.into(),
            workflow_id: None,
            source: None,
            context: Vec::new(),
            error_source: None,
        }
    }

    pub fn store_with_code(code: u16, message: impl Into<String>, workflow_id: Option<String>) -> Self {
        Self::Store {
            code,
            message: message.into(),
            workflow_id,
            source: None,
            context: Vec::new(),
            error_source: None,
        }
    }

    pub fn engine(message: impl Into<String>) -> Self {
        Self::Engine {
            code: ErrorCode::ENGINE_GENERIC,
            message: message.into(),
            workflow_name: None,
            step_index: None,
            source: None,
            context: Vec::new(),
            error_source: None,
        }
    }

    pub fn engine_with_code(
        code: u16,
        message: impl Into<String>,
        workflow_name: Option<String>,
        step_index: Option<usize>,
    ) -> Self {
        Self::Engine {
            code,
            message: message.into(),
            workflow_name,
            step_index,
            source: None,
            context: Vec::new(),
            error_source: None,
        }
    }

    pub fn queue(message: impl Into<String>) -> Self {
        Self::Queue {
            code: ErrorCode::QUEUE_GENERIC,
            message: message.into(),
            workflow_name: None,
            source: None,
            context: Vec::new(),
            error_source: None,
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            code: ErrorCode::OTHER_GENERIC,
            message: message.into(),
            source: None,
            context: Vec::new(),
            error_source: None,
        }
    }

    /// Attach a source error (effect-boundary conversion).
    pub fn with_source(mut self, source: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        match &mut self {
            Self::Store { source: src, .. }
            | Self::Engine { source: src, .. }
            | Self::Queue { source: src, .. }
            | Self::Other { source: src, .. } => {
                *src = Some(source.into());
            }
        }
        self
    }

    /// Append a context message (fluent API).
    pub fn context(mut self, message: impl Into<String>) -> Self {
        let ctx = ErrorContext {
            message: message.into(),
            location: None,
        };
        match &mut self {
            Self::Store { context, .. }
            | Self::Engine { context, .. }
            | Self::Queue { context, .. }
            | Self::Other { context, .. } => context.push(ctx),
        }
        self
    }

    /// Append a context message with the caller's source location.
    #[track_caller]
    pub fn context_at(mut self, message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        let ctx = ErrorContext {
            message: message.into(),
            location: Some(location.file()),
        };
        match &mut self {
            Self::Store { context, .. }
            | Self::Engine { context, .. }
            | Self::Queue { context, .. }
            | Self::Other { context, .. } => context.push(ctx),
        }
        self
    }

    /// The accumulated context chain, oldest first.
    pub fn chain(&self) -> &[ErrorContext] {
        match self {
            Self::Store { context, .. }
            | Self::Engine { context, .. }
            | Self::Queue { context, .. }
            | Self::Other { context, .. } => context,
        }
    }

    /// The numeric error code.
    pub fn code(&self) -> u16 {
        match self {
            Self::Store { code, .. }
            | Self::Engine { code, .. }
            | Self::Queue { code, .. }
            | Self::Other { code, .. } => *code,
        }
    }

    /// Process exit code to use for this error at the CLI boundary.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Store { .. } => 3,
            Self::Engine { .. } => 4,
            Self::Queue { .. } => 5,
            Self::Other { .. } => 1,
        }
    }

    /// End-user-friendly message (no context chain, no source).
    pub fn user_message(&self) -> String {
        match self {
            Self::Store {
                message,
                workflow_id,
                ..
            } => match workflow_id {
                Some(id) => format!("Checkpoint store error for workflow {id}: {message}"),
                None => format!("Checkpoint store error: {message}"),
            },
            Self::Engine {
                message,
                workflow_name,
                step_index,
                ..
            } => {
                let mut msg = String::from("Workflow engine error");
                if let Some(name) = workflow_name {
                    msg.push_str(&format!(" in '{name}'"));
                }
                if let Some(step) = step_index {
                    msg.push_str(&format!(" at step {step}"));
                }
                format!("{msg}: {message}")
            }
            Self::Queue {
                message,
                workflow_name,
                ..
            } => match workflow_name {
                Some(name) => format!("Queue error for '{name}': {message}"),
                None => format!("Queue error: {message}"),
            },
            Self::Other { message, .. } => message.clone(),
        }
    }

    /// Developer-facing message with the full context and source chain.
    pub fn developer_message(&self) -> String {
        let mut msg = format!("{self}");
        let chain = self.chain();
        if !chain.is_empty() {
            msg.push_str("\n\nContext chain:");
            for (i, ctx) in chain.iter().enumerate() {
                msg.push_str(&format!("\n  {i}: {}", ctx.message));
                if let Some(loc) = ctx.location {
                    msg.push_str(&format!(" (at {loc})"));
                }
            }
        }
        if let Some(src) = &self.error_source_ref() {
            msg.push_str(&format!("\n\nCaused by:\n  {}", src.developer_message()));
        }
        msg
    }

    fn error_source_ref(&self) -> Option<&SchedulerError> {
        self.error_source().map(|arc| arc.as_ref())
    }

    /// The wrapped upstream `SchedulerError`, if this error was built from one.
    pub fn error_source(&self) -> Option<&Arc<SchedulerError>> {
        match self {
            Self::Store { error_source, .. }
            | Self::Engine { error_source, .. }
            | Self::Queue { error_source, .. }
            | Self::Other { error_source, .. } => error_source.as_ref(),
        }
    }

    /// Attach another `SchedulerError` as the logical cause of this one.
    pub fn with_error_source(mut self, source: SchedulerError) -> Self {
        let arc = Some(Arc::new(source));
        match &mut self {
            Self::Store { error_source, .. }
            | Self::Engine { error_source, .. }
            | Self::Queue { error_source, .. }
            | Self::Other { error_source, .. } => *error_source = arc,
        }
        self
    }
}
