//! Per-protocol batch executors.
//!
//! A [`BatchRunnable`] turns a [`TaskGroup`] into one combined request,
//! executes it through a session and reports exactly one outcome per task.
//! The walk itself (timing, fallbacks, aggregation, failure isolation) is
//! shared; protocols only decide how a task becomes a request step and how
//! a step value is narrowed to the task's reading.
//!
//! Split into focused submodules:
//! - `decode`: numeric and availability conversion, the AVAIL fold
//! - `walk`: the positional response walk shared by all protocols
//! - `tree`, `object`, `platform`: protocol specifics

pub mod decode;
mod object;
mod platform;
mod tree;
mod walk;
#[cfg(test)]
mod tests;

use serde_json::Value;
use vigil_core::{Protocol, Task};

use crate::completion::CompletionHandler;
use crate::diagnostics::Diagnostics;
use crate::group::TaskGroup;
use crate::session::{BatchRequest, ReadStep, SessionFactories};

pub use object::ObjectRunnable;
pub use platform::PlatformRunnable;
pub use tree::TreeRunnable;

/// Executes task groups of one protocol.
pub trait BatchRunnable: Send + Sync {
    fn protocol(&self) -> Protocol;

    /// Request step reading `task`.
    fn read_step(&self, task: &Task) -> ReadStep;

    /// Narrow a step value to the task's reading. Protocols that resolve
    /// subrefs remotely return the value unchanged.
    fn extract(&self, _task: &Task, value: &Value) -> Result<Value, String> {
        Ok(value.clone())
    }

    fn decode_metric(&self, value: &Value) -> Result<f64, String> {
        decode::metric_value(value)
    }

    /// One combined request covering every task of the group, in order.
    fn build_request(&self, group: &TaskGroup) -> BatchRequest {
        BatchRequest {
            kind: group.kind().clone(),
            steps: group.iter().map(|task| self.read_step(task)).collect(),
        }
    }

    /// Execute `group` and report one outcome per task to `handler`.
    fn run(
        &self,
        group: &TaskGroup,
        sessions: &SessionFactories,
        handler: &dyn CompletionHandler,
        diagnostics: &Diagnostics,
    ) {
        walk::run_group(self, group, sessions, handler, diagnostics);
    }
}

/// Runnable for the given protocol.
pub fn for_protocol(protocol: Protocol) -> &'static dyn BatchRunnable {
    match protocol {
        Protocol::Tree => &TreeRunnable,
        Protocol::Object => &ObjectRunnable,
        Protocol::Platform => &PlatformRunnable,
    }
}
