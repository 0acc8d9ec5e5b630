//! Checkpoint store backend selection.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Which [`crate::storage::CheckpointStore`] implementation to construct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    /// One JSON file per workflow id under `base_dir` (default, durable).
    File,
    /// In-process only, for tests and the in-memory demo.
    Memory,
    /// SQLite-backed, behind the `sqlite` feature.
    #[cfg(feature = "sqlite")]
    Sqlite,
}

impl Default for BackendType {
    fn default() -> Self {
        Self::File
    }
}

/// Checkpoint store configuration, read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub backend: BackendType,
    /// Base directory for the file backend, or the SQLite database path.
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,
}

fn default_base_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".preemptix")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendType::default(),
            base_dir: default_base_dir(),
        }
    }
}

impl StorageConfig {
    /// Build configuration from the `PREEMPTIX_STORAGE_BACKEND` and
    /// `PREEMPTIX_STORAGE_DIR` environment variables, falling back to
    /// defaults for anything unset or unrecognized.
    pub fn from_env() -> Self {
        let backend = std::env::var("PREEMPTIX_STORAGE_BACKEND")
            .ok()
            .and_then(|s| match s.to_lowercase().as_str() {
                "file" => Some(BackendType::File),
                "memory" => Some(BackendType::Memory),
                #[cfg(feature = "sqlite")]
                "sqlite" => Some(BackendType::Sqlite),
                _ => None,
            })
            .unwrap_or_default();

        let base_dir = std::env::var("PREEMPTIX_STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_base_dir());

        Self { backend, base_dir }
    }
}
