use serde_json::Value;
use vigil_core::{Protocol, Task};

use crate::session::ReadStep;

use super::BatchRunnable;

/// Path-addressed management tree. Composite steps read whole attributes;
/// subrefs are resolved locally in the returned composite value.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeRunnable;

impl BatchRunnable for TreeRunnable {
    fn protocol(&self) -> Protocol {
        Protocol::Tree
    }

    fn read_step(&self, task: &Task) -> ReadStep {
        match task.attribute() {
            Some(attribute) => ReadStep::Attribute {
                location: task.location().clone(),
                attribute: attribute.to_string(),
                path: None,
            },
            None => ReadStep::Resource {
                location: task.location().clone(),
            },
        }
    }

    /// An object without the subref field yields null, which reads as
    /// DOWN for availability. Only a non-object value is malformed.
    fn extract(&self, task: &Task, value: &Value) -> Result<Value, String> {
        match (task.subref(), value) {
            (None, _) => Ok(value.clone()),
            (Some(subref), Value::Object(fields)) => {
                Ok(fields.get(subref).cloned().unwrap_or(Value::Null))
            }
            (Some(subref), other) => Err(format!("value {other} has no field '{subref}'")),
        }
    }
}
