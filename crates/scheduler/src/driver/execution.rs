use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::{debug, error, info, warn};

use crate::error::SchedulerError;
use crate::group::{GroupKey, TaskGroup};
use crate::runnable;

use super::{Scheduler, SchedulerState};

/// Releases a group's in-flight key and decrements the active-group
/// counter when its worker finishes, including by panic.
struct ActiveGroup {
    key: GroupKey,
    in_flight: Arc<Mutex<HashSet<GroupKey>>>,
    active: Arc<AtomicUsize>,
}

impl Drop for ActiveGroup {
    fn drop(&mut self) {
        if let Ok(mut in_flight) = self.in_flight.lock() {
            in_flight.remove(&self.key);
        }
        self.active.fetch_sub(1, Ordering::AcqRel);
    }
}

impl Scheduler {
    /// Run the scheduling loop. Blocks until shutdown is requested and all
    /// in-flight groups have finished (or the shutdown timeout elapsed).
    pub fn run(&self) -> Result<(), SchedulerError> {
        let started = self.state.compare_exchange(
            SchedulerState::NotStarted as u8,
            SchedulerState::Running as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        if let Err(current) = started {
            return Err(SchedulerError::AlreadyStarted(format!(
                "{:?}",
                SchedulerState::from_u8(current)
            )));
        }

        let num_workers = self.config.resolved_worker_threads();
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(num_workers)
            .thread_name(|i| format!("vigil-worker-{i}"))
            .panic_handler(|_| error!("Worker panicked while collecting a group"))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                self.state.store(SchedulerState::Stopped as u8, Ordering::Release);
                return Err(SchedulerError::WorkerPool(e.to_string()));
            }
        };

        info!(
            "Scheduler starting with {} workers, {} registered tasks",
            num_workers,
            self.task_count()
        );

        let tick = self.config.tick();
        let report_every = self.config.diagnostics_interval();
        let mut last_report = Instant::now();

        while self.state() == SchedulerState::Running {
            for group in self.collect_due(Instant::now()) {
                self.dispatch(&pool, group);
            }

            if let Some(every) = report_every {
                if last_report.elapsed() >= every {
                    self.diagnostics.report();
                    last_report = Instant::now();
                }
            }

            std::thread::sleep(tick);
        }

        self.wait_for_in_flight(self.config.shutdown_timeout());
        self.state.store(SchedulerState::Stopped as u8, Ordering::Release);
        info!("Scheduler stopped");
        Ok(())
    }

    /// Submit one group to the pool, unless its previous run is still in
    /// flight. A skipped group is counted as delayed and waits for its next
    /// deadline.
    fn dispatch(&self, pool: &rayon::ThreadPool, group: TaskGroup) {
        if !self.claim(group.key()) {
            self.diagnostics.mark_delayed(group.kind().protocol);
            debug!(group = %group.key(), "Previous run still in flight, skipping group");
            return;
        }

        let runnable = runnable::for_protocol(group.kind().protocol);
        let sessions = Arc::clone(&self.sessions);
        let handler = Arc::clone(&self.handler);
        let diagnostics = Arc::clone(&self.diagnostics);

        self.active_groups.fetch_add(1, Ordering::AcqRel);
        let active = ActiveGroup {
            key: group.key().clone(),
            in_flight: Arc::clone(&self.in_flight),
            active: Arc::clone(&self.active_groups),
        };
        self.diagnostics.mark_group_dispatched();
        debug!(group = %group.key(), tasks = group.len(), "Dispatching group");

        pool.spawn(move || {
            let _active = active;
            runnable.run(&group, &sessions, handler.as_ref(), &diagnostics);
        });
    }

    /// Mark `key` in flight. False when it already was.
    pub(super) fn claim(&self, key: &GroupKey) -> bool {
        match self.in_flight.lock() {
            Ok(mut in_flight) => in_flight.insert(key.clone()),
            Err(_) => false,
        }
    }

    fn wait_for_in_flight(&self, timeout: Duration) {
        let deadline = Instant::now() + timeout;
        loop {
            let active = self.active_groups.load(Ordering::Acquire);
            if active == 0 {
                return;
            }
            if Instant::now() >= deadline {
                warn!(active, "Shutdown timeout elapsed with groups still running");
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }
}
