use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use tracing::info;
use vigil_core::{Interval, Task};

use crate::completion::CompletionHandler;
use crate::config::SchedulerConfig;
use crate::diagnostics::Diagnostics;
use crate::group::GroupKey;
use crate::session::SessionFactories;

use super::scheduling::IntervalSchedule;

/// Lifecycle of a [`Scheduler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SchedulerState {
    NotStarted = 0,
    Running = 1,
    /// No new groups are dispatched; in-flight groups finish.
    Stopping = 2,
    Stopped = 3,
}

impl SchedulerState {
    pub(super) fn from_u8(value: u8) -> Self {
        match value {
            0 => SchedulerState::NotStarted,
            1 => SchedulerState::Running,
            2 => SchedulerState::Stopping,
            _ => SchedulerState::Stopped,
        }
    }
}

/// Registered tasks, one schedule per interval in use.
#[derive(Default)]
pub(super) struct TaskRegistry {
    pub(super) schedules: HashMap<Interval, IntervalSchedule>,
    /// Interval each task id is registered under.
    pub(super) intervals: HashMap<String, Interval>,
}

/// The polling scheduler. Groups due tasks per interval and runs each group
/// on a worker pool with its protocol's batch runnable.
pub struct Scheduler {
    pub(super) config: SchedulerConfig,
    pub(super) sessions: Arc<SessionFactories>,
    pub(super) handler: Arc<dyn CompletionHandler>,
    pub(super) diagnostics: Arc<Diagnostics>,
    pub(super) registry: Arc<RwLock<TaskRegistry>>,
    /// Lifecycle state ([`SchedulerState`] as u8).
    pub(super) state: Arc<AtomicU8>,
    /// Groups dispatched to the pool and not yet finished.
    pub(super) active_groups: Arc<AtomicUsize>,
    /// Keys of groups whose run has not finished. A group is never
    /// dispatched again while its key is here.
    pub(super) in_flight: Arc<Mutex<HashSet<GroupKey>>>,
}

/// Cloneable handle for observing and stopping a running scheduler.
#[derive(Clone)]
pub struct SchedulerHandle {
    state: Arc<AtomicU8>,
}

impl SchedulerHandle {
    pub fn state(&self) -> SchedulerState {
        SchedulerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Request a graceful stop.
    pub fn shutdown(&self) {
        request_stop(&self.state);
    }
}

fn request_stop(state: &AtomicU8) {
    let running = state.compare_exchange(
        SchedulerState::Running as u8,
        SchedulerState::Stopping as u8,
        Ordering::AcqRel,
        Ordering::Acquire,
    );
    match running {
        Ok(_) => info!("Scheduler shutdown requested"),
        Err(current) if current == SchedulerState::NotStarted as u8 => {
            state.store(SchedulerState::Stopped as u8, Ordering::Release);
            info!("Scheduler stopped before it started");
        }
        Err(_) => {}
    }
}

impl Scheduler {
    pub fn new(
        config: SchedulerConfig,
        sessions: SessionFactories,
        handler: Arc<dyn CompletionHandler>,
        diagnostics: Arc<Diagnostics>,
    ) -> Self {
        Self {
            config,
            sessions: Arc::new(sessions),
            handler,
            diagnostics,
            registry: Arc::new(RwLock::new(TaskRegistry::default())),
            state: Arc::new(AtomicU8::new(SchedulerState::NotStarted as u8)),
            active_groups: Arc::new(AtomicUsize::new(0)),
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Register a task. A task with the same id is replaced.
    pub fn register_task(&self, task: Arc<Task>) {
        self.unregister_task(task.id());
        let Ok(mut registry) = self.registry.write() else {
            return;
        };
        info!(task = %task, "Registered task");
        let interval = task.interval();
        registry.intervals.insert(task.id().to_string(), interval);
        registry
            .schedules
            .entry(interval)
            .or_insert_with(|| IntervalSchedule::new(interval))
            .tasks
            .push(task);
    }

    /// Remove a task; it is never scheduled again. Returns whether it was
    /// registered.
    pub fn unregister_task(&self, id: &str) -> bool {
        let Ok(mut registry) = self.registry.write() else {
            return false;
        };
        let Some(interval) = registry.intervals.remove(id) else {
            return false;
        };
        if let Some(schedule) = registry.schedules.get_mut(&interval) {
            schedule.tasks.retain(|t| t.id() != id);
            if schedule.tasks.is_empty() {
                registry.schedules.remove(&interval);
            }
        }
        info!(task = %id, "Unregistered task");
        true
    }

    /// Number of registered tasks.
    pub fn task_count(&self) -> usize {
        self.registry.read().map(|r| r.intervals.len()).unwrap_or(0)
    }

    /// Intervals currently in use.
    pub fn intervals(&self) -> Vec<Interval> {
        let mut intervals: Vec<Interval> = self
            .registry
            .read()
            .map(|r| r.schedules.keys().copied().collect())
            .unwrap_or_default();
        intervals.sort();
        intervals
    }

    pub fn state(&self) -> SchedulerState {
        SchedulerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Request a graceful stop. In-flight groups are not interrupted.
    pub fn shutdown(&self) {
        request_stop(&self.state);
    }

    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            state: Arc::clone(&self.state),
        }
    }

    pub fn diagnostics(&self) -> Arc<Diagnostics> {
        Arc::clone(&self.diagnostics)
    }

    /// Groups currently executing on the pool.
    pub fn active_groups(&self) -> usize {
        self.active_groups.load(Ordering::Acquire)
    }
}
