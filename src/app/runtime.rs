//! Runtime initialization and setup
//!
//! This module handles application startup: logging, then building the
//! configured checkpoint store backend.

use std::sync::Arc;

use anyhow::Result;

use crate::app::{config::AppConfig, logging::init_logging};
use crate::storage::{build_store, CheckpointStore, StorageConfig};

/// Initialize the application: set up logging, then construct the
/// checkpoint store for the configured backend.
pub async fn initialize_app(config: &AppConfig, storage: &StorageConfig) -> Result<Arc<dyn CheckpointStore>> {
    init_logging(config);

    let store = build_store(storage).await?;
    Ok(store)
}
