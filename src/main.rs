//! preemptix CLI entry point.
//!
//! A thin composition layer: parse arguments, initialize the app (logging
//! and the checkpoint store), dispatch the command, report fatal errors.

use clap::Parser;

use preemptix::app::{handle_fatal_error, initialize_app, AppConfig};
use preemptix::cli::{execute_command, Cli};
use preemptix::storage::StorageConfig;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let app_config = match AppConfig::new(cli.verbose) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to initialize application configuration: {e}");
            std::process::exit(1);
        }
    };

    let storage_config = StorageConfig::from_env();

    let store = match initialize_app(&app_config, &storage_config).await {
        Ok(store) => store,
        Err(e) => handle_fatal_error(e, cli.verbose),
    };

    if let Err(e) = execute_command(cli.command, store).await {
        handle_fatal_error(e, cli.verbose);
    }
}
