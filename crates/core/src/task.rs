use std::fmt;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::TaskError;
use crate::interval::Interval;
use crate::location::{Location, Protocol};

/// What a task samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskType {
    /// Numeric measurement.
    Metric,
    /// Availability state.
    Avail,
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TaskType::Metric => "METRIC",
            TaskType::Avail => "AVAIL",
        })
    }
}

/// Availability state reported for an AVAIL task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Avail {
    Up,
    Down,
    Unknown,
}

impl fmt::Display for Avail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Avail::Up => "UP",
            Avail::Down => "DOWN",
            Avail::Unknown => "UNKNOWN",
        })
    }
}

/// Protocol family plus the endpoint a task is polled from. Tasks share a
/// batch only when their kinds are equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Kind {
    pub protocol: Protocol,
    pub endpoint: String,
}

impl Kind {
    pub fn new(protocol: Protocol, endpoint: impl Into<String>) -> Self {
        Self {
            protocol,
            endpoint: endpoint.into(),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.protocol, self.endpoint)
    }
}

/// An immutable sampling task bound to a location on one endpoint.
#[derive(Debug, Clone)]
pub struct Task {
    id: String,
    task_type: TaskType,
    interval: Interval,
    kind: Kind,
    location: Location,
    attribute: Option<String>,
    subref: Option<String>,
    up_regex: Option<Regex>,
}

impl Task {
    pub fn builder(
        id: impl Into<String>,
        task_type: TaskType,
        interval: Interval,
        kind: Kind,
        location: Location,
    ) -> TaskBuilder {
        TaskBuilder {
            id: id.into(),
            task_type,
            interval,
            kind,
            location,
            attribute: None,
            subref: None,
            up_regex: None,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn task_type(&self) -> TaskType {
        self.task_type
    }

    pub fn interval(&self) -> Interval {
        self.interval
    }

    pub fn kind(&self) -> &Kind {
        &self.kind
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    /// What to read at the location. `None` on an AVAIL task means an
    /// existence check.
    pub fn attribute(&self) -> Option<&str> {
        self.attribute.as_deref()
    }

    pub fn subref(&self) -> Option<&str> {
        self.subref.as_deref()
    }

    /// Anchored form of the configured up-regex (full-match semantics).
    pub fn up_regex(&self) -> Option<&Regex> {
        self.up_regex.as_ref()
    }

    pub fn is_existence_check(&self) -> bool {
        self.task_type == TaskType::Avail && self.attribute.is_none()
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}[{}", self.task_type, self.kind, self.location)?;
        if let Some(attribute) = &self.attribute {
            write!(f, " {attribute}")?;
        }
        if let Some(subref) = &self.subref {
            write!(f, "#{subref}")?;
        }
        write!(f, "] every {}", self.interval)
    }
}

/// Validating builder for [`Task`].
#[derive(Debug, Clone)]
pub struct TaskBuilder {
    id: String,
    task_type: TaskType,
    interval: Interval,
    kind: Kind,
    location: Location,
    attribute: Option<String>,
    subref: Option<String>,
    up_regex: Option<String>,
}

impl TaskBuilder {
    pub fn attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }

    pub fn subref(mut self, subref: impl Into<String>) -> Self {
        self.subref = Some(subref.into());
        self
    }

    pub fn up_regex(mut self, pattern: impl Into<String>) -> Self {
        self.up_regex = Some(pattern.into());
        self
    }

    pub fn build(self) -> Result<Task, TaskError> {
        if self.id.is_empty() {
            return Err(TaskError::EmptyId);
        }
        if self.interval.is_zero() {
            return Err(TaskError::ZeroInterval(self.id));
        }
        if self.location.protocol() != self.kind.protocol {
            return Err(TaskError::ProtocolMismatch {
                id: self.id,
                location: self.location.protocol(),
                kind: self.kind.protocol,
            });
        }
        let up_regex = match self.up_regex {
            Some(_) if self.task_type != TaskType::Avail => {
                return Err(TaskError::UpRegexOnMetric(self.id));
            }
            Some(pattern) => Some(Regex::new(&format!("^(?:{pattern})$")).map_err(|e| {
                TaskError::InvalidUpRegex {
                    id: self.id.clone(),
                    reason: e.to_string(),
                }
            })?),
            None => None,
        };
        Ok(Task {
            id: self.id,
            task_type: self.task_type,
            interval: self.interval,
            kind: self.kind,
            location: self.location,
            attribute: self.attribute.filter(|a| !a.is_empty()),
            subref: self.subref.filter(|s| !s.is_empty()),
            up_regex,
        })
    }
}
