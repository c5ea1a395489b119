use serde::{Deserialize, Serialize};
use vigil_core::{Interval, Kind, Location, LocationResolver, Protocol, ProtocolResolver, Task, TaskType};

use super::{AgentSection, ConfigError};

/// One `[[tasks]]` entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Task id. May contain location placeholders (`%s`, `%name%`,
    /// `%_ManagedServerName%`); a random id is generated when absent.
    #[serde(default)]
    pub id: Option<String>,

    #[serde(rename = "type")]
    pub task_type: TaskType,

    #[serde(default = "default_protocol")]
    pub protocol: Protocol,

    /// Endpoint to poll. Defaults to `agent.endpoint`.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Optional base location; `location` is resolved relative to it.
    #[serde(default)]
    pub base: Option<String>,

    pub location: String,

    #[serde(default)]
    pub attribute: Option<String>,

    #[serde(default)]
    pub subref: Option<String>,

    #[serde(default)]
    pub up_regex: Option<String>,

    #[serde(default = "default_interval")]
    pub interval: Interval,
}

fn default_protocol() -> Protocol {
    Protocol::Platform
}

fn default_interval() -> Interval {
    Interval::seconds(60)
}

impl TaskConfig {
    /// Build the task this entry describes. `index` only labels errors.
    pub fn build(&self, index: usize, agent: &AgentSection) -> Result<Task, ConfigError> {
        let location_err = |source| ConfigError::Location { index, source };

        let location = Location::parse(self.protocol, &self.location).map_err(location_err)?;
        let base = self
            .base
            .as_deref()
            .map(|b| Location::parse(self.protocol, b))
            .transpose()
            .map_err(location_err)?;
        let location = ProtocolResolver
            .absolutize(base.as_ref(), Some(&location))
            .map_err(location_err)?
            .unwrap_or(location);

        let endpoint = self.endpoint.clone().unwrap_or_else(|| agent.endpoint.clone());
        let id = match &self.id {
            Some(template) => ProtocolResolver.apply_template(template, &location, &endpoint),
            None => uuid::Uuid::new_v4().to_string(),
        };

        let mut builder = Task::builder(
            id,
            self.task_type,
            self.interval,
            Kind::new(self.protocol, endpoint),
            location,
        );
        if let Some(attribute) = &self.attribute {
            builder = builder.attribute(attribute.as_str());
        }
        if let Some(subref) = &self.subref {
            builder = builder.subref(subref.as_str());
        }
        if let Some(pattern) = &self.up_regex {
            builder = builder.up_regex(pattern.as_str());
        }
        builder.build().map_err(|source| ConfigError::Task { index, source })
    }

    /// Host platform tasks sampled when no configuration file is given.
    pub fn platform_defaults() -> Vec<TaskConfig> {
        let metric = |id: &str, location: &str, attribute: &str, seconds: u64| TaskConfig {
            id: Some(id.to_string()),
            task_type: TaskType::Metric,
            protocol: Protocol::Platform,
            endpoint: None,
            base: None,
            location: location.to_string(),
            attribute: Some(attribute.to_string()),
            subref: None,
            up_regex: None,
            interval: Interval::seconds(seconds),
        };
        vec![
            metric("cpu-load", "/os=*", "System CPU Load", 30),
            metric("load-average", "/os=*", "System Load Average", 30),
            metric("process-count", "/os=*", "Process Count", 60),
            metric("memory-available", "/os=*/memory=*", "Available Memory", 30),
            metric("memory-total", "/os=*/memory=*", "Total Memory", 300),
            metric("disk-usable", "/os=*/file_store=*", "Usable Space", 60),
            TaskConfig {
                id: Some("os-up".to_string()),
                task_type: TaskType::Avail,
                protocol: Protocol::Platform,
                endpoint: None,
                base: None,
                location: "/os=*".to_string(),
                attribute: None,
                subref: None,
                up_regex: None,
                interval: Interval::seconds(60),
            },
        ]
    }
}
