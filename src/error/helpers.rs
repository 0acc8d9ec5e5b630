use super::{ErrorCode, SchedulerError};

/// Extension trait for convenient error conversion at effect boundaries.
pub trait ErrorExt<T> {
    /// Convert to `SchedulerError::Other` with context.
    fn to_other_error(self, context: impl Into<String>) -> Result<T, SchedulerError>;

    /// Convert to `SchedulerError::Store` with context.
    fn to_store_error(self, message: impl Into<String>) -> Result<T, SchedulerError>;

    /// Convert to `SchedulerError::Engine` with context.
    fn to_engine_error(self, message: impl Into<String>) -> Result<T, SchedulerError>;
}

impl<T, E> ErrorExt<T> for Result<T, E>
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    fn to_other_error(self, context: impl Into<String>) -> Result<T, SchedulerError> {
        self.map_err(|e| SchedulerError::other(context).with_source(e))
    }

    fn to_store_error(self, message: impl Into<String>) -> Result<T, SchedulerError> {
        self.map_err(|e| SchedulerError::store(message).with_source(e))
    }

    fn to_engine_error(self, message: impl Into<String>) -> Result<T, SchedulerError> {
        self.map_err(|e| SchedulerError::engine(message).with_source(e))
    }
}

/// Helper functions for common error scenarios.
pub mod common {
    use super::*;

    /// The checkpoint store is unreachable (spec.md's `StoreUnavailable`).
    pub fn store_unavailable(workflow_id: impl Into<String>, reason: &str) -> SchedulerError {
        SchedulerError::store_with_code(
            ErrorCode::STORE_UNAVAILABLE,
            format!("Checkpoint store unavailable: {reason}"),
            Some(workflow_id.into()),
        )
    }

    /// A workflow step's closure returned an error.
    pub fn step_failed(workflow_name: &str, step_index: usize, cause: &str) -> SchedulerError {
        SchedulerError::engine_with_code(
            ErrorCode::ENGINE_STEP_FAILED,
            format!("Step {step_index} failed: {cause}"),
            Some(workflow_name.to_string()),
            Some(step_index),
        )
    }

    /// A publish targeted a workflow name with no registered step list.
    pub fn unknown_workflow(workflow_name: &str) -> SchedulerError {
        SchedulerError::queue(format!("Workflow '{workflow_name}' is not registered"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_extension_trait_wraps_source() {
        let io_result: Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "test"));

        let wrapped = io_result.to_store_error("Failed to read checkpoint");
        assert!(wrapped.is_err());

        let err = wrapped.unwrap_err();
        assert_eq!(err.code(), ErrorCode::STORE_GENERIC);
    }

    #[test]
    fn common_error_helpers_carry_expected_codes() {
        let err = common::store_unavailable("wf-1", "connection refused");
        assert_eq!(err.code(), ErrorCode::STORE_UNAVAILABLE);
        assert!(err.user_message().contains("wf-1"));

        let err = common::step_failed("ingest", 2, "boom");
        assert_eq!(err.code(), ErrorCode::ENGINE_STEP_FAILED);
        assert!(err.user_message().contains("step 2"));

        let err = common::unknown_workflow("ghost");
        assert_eq!(err.code(), ErrorCode::QUEUE_GENERIC);
    }
}
