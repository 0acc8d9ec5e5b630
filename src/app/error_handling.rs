//! Error handling utilities
//!
//! This module provides centralized error handling for the application.

use tracing::error;

use crate::error::SchedulerError;

/// Handle fatal errors and exit with appropriate status code
///
/// For a [`SchedulerError`], shows the user-friendly message always and the
/// full context/source chain in verbose mode. For anything else, shows the
/// error and (in verbose mode) its `anyhow` cause chain.
pub fn handle_fatal_error(error: anyhow::Error, verbose: u8) -> ! {
    error!("Fatal error: {}", error);

    let exit_code = if let Some(scheduler_err) = error.downcast_ref::<SchedulerError>() {
        eprintln!("{}", scheduler_err.user_message());

        if verbose >= 1 {
            eprintln!("\nContext chain:\n{}", scheduler_err.developer_message());
        }

        scheduler_err.exit_code()
    } else {
        eprintln!("Error: {error}");

        if verbose >= 1 {
            eprintln!("\nError chain:");
            for (i, cause) in error.chain().enumerate() {
                eprintln!("  {i}: {cause}");
            }
        }

        1
    };

    std::process::exit(exit_code)
}
