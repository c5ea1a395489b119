use vigil_core::{Protocol, Task};

use crate::session::ReadStep;

use super::BatchRunnable;

/// Host platform. Each step is a metric query (attribute = metric name) or
/// an existence check on a platform resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlatformRunnable;

impl BatchRunnable for PlatformRunnable {
    fn protocol(&self) -> Protocol {
        Protocol::Platform
    }

    fn read_step(&self, task: &Task) -> ReadStep {
        match task.attribute() {
            Some(metric) => ReadStep::Attribute {
                location: task.location().clone(),
                attribute: metric.to_string(),
                path: None,
            },
            None => ReadStep::Resource {
                location: task.location().clone(),
            },
        }
    }
}
