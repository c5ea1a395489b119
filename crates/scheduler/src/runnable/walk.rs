use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};
use vigil_core::{Avail, DataPoint, Task, TaskType};

use crate::completion::CompletionHandler;
use crate::diagnostics::Diagnostics;
use crate::error::PollError;
use crate::group::TaskGroup;
use crate::session::{SessionFactories, StepOutcome, TargetOutcome};

use super::{decode, BatchRunnable};

/// Outcome of decoding one step that does not abort the group.
enum Decoded {
    Point(DataPoint),
    /// The endpoint reported a failure for this task's step.
    Failed(PollError),
}

pub(super) fn run_group<R>(
    runnable: &R,
    group: &TaskGroup,
    sessions: &SessionFactories,
    handler: &dyn CompletionHandler,
    diagnostics: &Diagnostics,
) where
    R: BatchRunnable + ?Sized,
{
    let protocol = runnable.protocol();
    let tasks = group.tasks();
    if tasks.is_empty() {
        return;
    }

    let mut session = match sessions.open(group.kind()) {
        Ok(session) => session,
        Err(e) => {
            abort_from(0, group, PollError::from(e), runnable, handler, diagnostics);
            return;
        }
    };

    let request = runnable.build_request(group);
    let started = Instant::now();
    let result = session.execute(&request);
    let elapsed = started.elapsed();
    drop(session);

    diagnostics.record_request(protocol, elapsed);
    if elapsed > group.interval().as_duration() {
        diagnostics.mark_delayed(protocol);
        debug!(
            group = %group.key(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Round trip exceeded collection interval"
        );
    }

    let response = match result {
        Ok(response) => response,
        Err(e) => {
            abort_from(0, group, PollError::from(e), runnable, handler, diagnostics);
            return;
        }
    };

    if response.outcomes.len() != tasks.len() {
        warn!(
            group = %group.key(),
            expected = tasks.len(),
            actual = response.outcomes.len(),
            "Result count does not match group size"
        );
    }

    for (index, task) in tasks.iter().enumerate() {
        let Some(outcome) = response.outcomes.get(index) else {
            let error = PollError::MissingResult {
                task: task.id().to_string(),
                index,
            };
            abort_from(index, group, error, runnable, handler, diagnostics);
            return;
        };

        match decode_step(runnable, task, outcome, diagnostics) {
            Ok(Decoded::Point(point)) => handler.on_completed(point),
            Ok(Decoded::Failed(error)) => {
                diagnostics.mark_error(protocol);
                handler.on_failed(&error);
                handler.on_completed(DataPoint::unknown(Arc::clone(task)));
            }
            Err(error) => {
                abort_from(index, group, error, runnable, handler, diagnostics);
                return;
            }
        }
    }
}

/// Report `error` once and give every task from `index` on an UNKNOWN outcome.
fn abort_from<R>(
    index: usize,
    group: &TaskGroup,
    error: PollError,
    runnable: &R,
    handler: &dyn CompletionHandler,
    diagnostics: &Diagnostics,
) where
    R: BatchRunnable + ?Sized,
{
    let remaining = &group.tasks()[index..];
    warn!(
        group = %group.key(),
        error = %error,
        remaining = remaining.len(),
        "Group collection aborted"
    );
    diagnostics.mark_error(runnable.protocol());
    handler.on_failed(&error);
    for task in remaining {
        handler.on_completed(DataPoint::unknown(Arc::clone(task)));
    }
}

/// Decode one step. `Err` aborts the rest of the group.
fn decode_step<R>(
    runnable: &R,
    task: &Arc<Task>,
    outcome: &StepOutcome,
    diagnostics: &Diagnostics,
) -> Result<Decoded, PollError>
where
    R: BatchRunnable + ?Sized,
{
    let task_ref = Arc::clone(task);

    if task.is_existence_check() {
        let avail = match outcome {
            StepOutcome::Value(_) => Avail::Up,
            StepOutcome::Targets(targets) if targets.iter().any(|t| t.result.is_ok()) => Avail::Up,
            StepOutcome::Targets(_) | StepOutcome::Failed(_) => Avail::Down,
        };
        return Ok(Decoded::Point(DataPoint::avail(task_ref, avail)));
    }

    let decode_error = |reason: String| PollError::Decode {
        task: task.id().to_string(),
        reason,
    };

    match (task.task_type(), outcome) {
        (_, StepOutcome::Failed(reason)) => Ok(Decoded::Failed(PollError::StepFailed {
            task: task.id().to_string(),
            reason: reason.clone(),
        })),

        (TaskType::Metric, StepOutcome::Value(value)) => {
            let value = runnable
                .extract(task, value)
                .and_then(|v| runnable.decode_metric(&v))
                .map_err(decode_error)?;
            Ok(Decoded::Point(DataPoint::metric(task_ref, value)))
        }

        (TaskType::Metric, StepOutcome::Targets(targets)) => {
            let values = resolve_targets(runnable, task, targets, diagnostics, |v| runnable.decode_metric(v));
            if values.is_empty() {
                return Ok(Decoded::Point(DataPoint::unknown(task_ref)));
            }
            Ok(Decoded::Point(DataPoint::metric(task_ref, values.into_iter().sum())))
        }

        (TaskType::Avail, StepOutcome::Value(value)) => {
            let value = runnable.extract(task, value).map_err(decode_error)?;
            let avail = decode::avail_value(&decode::value_text(&value), task.up_regex());
            Ok(Decoded::Point(DataPoint::avail(task_ref, avail)))
        }

        (TaskType::Avail, StepOutcome::Targets(targets)) => {
            let states = resolve_targets(runnable, task, targets, diagnostics, |v| {
                Ok(decode::avail_value(&decode::value_text(v), task.up_regex()))
            });
            Ok(Decoded::Point(DataPoint::avail(task_ref, decode::fold_avail(states))))
        }
    }
}

/// Decode every resolvable target, skipping (and counting) failed ones.
fn resolve_targets<R, T>(
    runnable: &R,
    task: &Task,
    targets: &[TargetOutcome],
    diagnostics: &Diagnostics,
    convert: impl Fn(&serde_json::Value) -> Result<T, String>,
) -> Vec<T>
where
    R: BatchRunnable + ?Sized,
{
    let mut resolved = Vec::with_capacity(targets.len());
    for target in targets {
        let decoded = target
            .result
            .as_ref()
            .map_err(Clone::clone)
            .and_then(|v| runnable.extract(task, v))
            .and_then(|v| convert(&v));
        match decoded {
            Ok(value) => resolved.push(value),
            Err(reason) => {
                diagnostics.mark_error(runnable.protocol());
                debug!(
                    task = %task.id(),
                    target = %target.location,
                    reason = %reason,
                    "Skipping unresolvable target"
                );
            }
        }
    }
    resolved
}
