use serde_json::Value;
use vigil_core::{Protocol, Task};

use crate::session::ReadStep;

use super::{decode, BatchRunnable};

/// Object-name registry. One bulk read per group; subrefs travel with the
/// request as a path into the attribute's composite value.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjectRunnable;

impl BatchRunnable for ObjectRunnable {
    fn protocol(&self) -> Protocol {
        Protocol::Object
    }

    fn read_step(&self, task: &Task) -> ReadStep {
        match task.attribute() {
            Some(attribute) => ReadStep::Attribute {
                location: task.location().clone(),
                attribute: attribute.to_string(),
                path: task.subref().map(str::to_string),
            },
            None => ReadStep::Resource {
                location: task.location().clone(),
            },
        }
    }

    /// Registries report unset attributes as null; that reads as NaN.
    fn decode_metric(&self, value: &Value) -> Result<f64, String> {
        match value {
            Value::Null => Ok(f64::NAN),
            other => decode::metric_value(other),
        }
    }
}
