use std::sync::Arc;
use std::time::Instant;

use vigil_core::{Interval, Task};

use crate::group::TaskGroup;
use crate::grouping::group_tasks;

use super::Scheduler;

/// Recurring deadline for every task sharing one interval.
pub(crate) struct IntervalSchedule {
    pub(crate) interval: Interval,
    /// Tasks in registration order.
    pub(crate) tasks: Vec<Arc<Task>>,
    pub(crate) next_due: Instant,
}

impl IntervalSchedule {
    /// New schedules are due immediately.
    pub(crate) fn new(interval: Interval) -> Self {
        Self {
            interval,
            tasks: Vec::new(),
            next_due: Instant::now(),
        }
    }
}

impl Scheduler {
    /// Collect the groups of every interval whose deadline has passed and
    /// push those deadlines one interval past `now`.
    pub(crate) fn collect_due(&self, now: Instant) -> Vec<TaskGroup> {
        let Ok(mut registry) = self.registry.write() else {
            return Vec::new();
        };
        let mut groups = Vec::new();
        for schedule in registry.schedules.values_mut() {
            if schedule.next_due <= now {
                schedule.next_due = now + schedule.interval.as_duration();
                groups.extend(group_tasks(&schedule.tasks));
            }
        }
        groups
    }
}
