//! Scheduler-wide configuration: the timing knobs spec.md leaves as
//! implementation parameters (the per-step pacing and the idle-queue poll
//! interval), plus the preemption toggle. Read once at startup and handed
//! down to the engine and the queue, mirroring the teacher's
//! `app::config::AppConfig` pattern of one small `Default`-able struct with
//! builder-style `with_*` setters.

use std::time::Duration;

/// Timing and preemption knobs shared by every engine and the queue in a
/// single scheduler instance.
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    /// Whether a strictly higher-priority arrival preempts in-flight work.
    pub preemptive: bool,
    /// Simulated per-step work duration; the engine's sole cancellation
    /// point is this paced yield between the pre-step checkpoint and the
    /// step invocation.
    pub step_pacing: Duration,
    /// How long the consumer loop sleeps between heap checks when idle,
    /// as a safety net alongside the immediate publish notification.
    pub poll_interval: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            preemptive: true,
            step_pacing: Duration::from_secs(2),
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl SchedulerConfig {
    pub fn with_preemptive(mut self, preemptive: bool) -> Self {
        self.preemptive = preemptive;
        self
    }

    pub fn with_step_pacing(mut self, step_pacing: Duration) -> Self {
        self.step_pacing = step_pacing;
        self
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }
}
