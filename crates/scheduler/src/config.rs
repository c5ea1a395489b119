use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Scheduler configuration, typically parsed from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Number of worker threads. 0 = available parallelism.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
    /// How often the driver checks interval deadlines, in milliseconds.
    #[serde(default = "default_tick_millis")]
    pub tick_millis: u64,
    /// How long shutdown waits for in-flight groups, in seconds.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
    /// Diagnostics report period in seconds. 0 disables reporting.
    #[serde(default = "default_diagnostics_interval")]
    pub diagnostics_interval_seconds: u64,
}

fn default_worker_threads() -> usize { 2 }
fn default_tick_millis() -> u64 { 100 }
fn default_shutdown_timeout() -> u64 { 30 }
fn default_diagnostics_interval() -> u64 { 60 }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            worker_threads: default_worker_threads(),
            tick_millis: default_tick_millis(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
            diagnostics_interval_seconds: default_diagnostics_interval(),
        }
    }
}

impl SchedulerConfig {
    /// Resolve worker thread count (0 means use available parallelism).
    pub fn resolved_worker_threads(&self) -> usize {
        if self.worker_threads == 0 {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4)
        } else {
            self.worker_threads
        }
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_millis.max(1))
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_seconds)
    }

    pub fn diagnostics_interval(&self) -> Option<Duration> {
        (self.diagnostics_interval_seconds > 0).then(|| Duration::from_secs(self.diagnostics_interval_seconds))
    }
}
