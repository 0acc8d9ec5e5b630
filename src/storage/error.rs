//! Error types for the checkpoint store.

use std::fmt;
use thiserror::Error;

use crate::error::{ErrorCode, SchedulerError};

/// Result type for checkpoint store operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors a [`crate::storage::CheckpointStore`] backend can raise.
#[derive(Error, Debug)]
pub enum StorageError {
    /// I/O operation failed (file backend).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The checkpoint payload could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The backend could not be reached (spec's `StoreUnavailable`).
    #[error("Checkpoint store unavailable: {0}")]
    Unavailable(String),

    /// Generic error wrapper for backend-specific failures (e.g. sqlx).
    #[error("Checkpoint store error: {0}")]
    Other(#[from] anyhow::Error),
}

impl StorageError {
    pub fn serialization<E: fmt::Display>(err: E) -> Self {
        Self::Serialization(err.to_string())
    }

    pub fn unavailable<E: fmt::Display>(msg: E) -> Self {
        Self::Unavailable(msg.to_string())
    }

    /// Whether a caller could reasonably retry this operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Unavailable(_))
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err)
    }
}

impl From<StorageError> for SchedulerError {
    fn from(err: StorageError) -> Self {
        let code = match &err {
            StorageError::Io(_) => ErrorCode::STORE_IO,
            StorageError::Serialization(_) => ErrorCode::STORE_SERIALIZATION,
            StorageError::Unavailable(_) => ErrorCode::STORE_UNAVAILABLE,
            StorageError::Other(_) => ErrorCode::STORE_GENERIC,
        };
        SchedulerError::store_with_code(code, err.to_string(), None).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_and_io_errors_are_retryable() {
        assert!(StorageError::unavailable("down").is_retryable());
        assert!(StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, "x")).is_retryable());
        assert!(!StorageError::serialization("bad json").is_retryable());
    }

    #[test]
    fn converts_into_scheduler_error_with_matching_code() {
        let err: SchedulerError = StorageError::unavailable("down").into();
        assert_eq!(err.code(), ErrorCode::STORE_UNAVAILABLE);
    }
}
