//! The command-line surface: argument parsing and command dispatch.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::config::SchedulerConfig;
use crate::demo::run_layered_demo;
use crate::storage::CheckpointStore;

/// A priority-preemptive workflow scheduler.
#[derive(Parser)]
#[command(name = "preemptix")]
#[command(about = "preemptix - a priority-preemptive workflow scheduler", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace, -vvv for all)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the layered-architecture demo: a long-running data-processing
    /// workflow interrupted and preempted by an urgent notification.
    #[command(name = "run-demo")]
    RunDemo {
        /// Disable preemption: the notification waits behind the
        /// data-processing run instead of interrupting it.
        #[arg(long)]
        no_preempt: bool,

        /// Per-step simulated work duration, in milliseconds.
        #[arg(long, default_value = "2000")]
        step_pacing_ms: u64,
    },
}

/// Dispatch a parsed command against the given checkpoint store.
pub async fn execute_command(command: Option<Commands>, store: Arc<dyn CheckpointStore>) -> anyhow::Result<()> {
    match command {
        Some(Commands::RunDemo {
            no_preempt,
            step_pacing_ms,
        }) => {
            let config = SchedulerConfig::default()
                .with_preemptive(!no_preempt)
                .with_step_pacing(Duration::from_millis(step_pacing_ms));
            run_layered_demo(store, config).await
        }
        None => {
            println!("preemptix: no command given. Try `preemptix run-demo`.");
            Ok(())
        }
    }
}
