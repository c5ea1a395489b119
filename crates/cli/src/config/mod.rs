//! Agent configuration.
//!
//! Parsed from `vigil.toml`, then `VIGIL_SECTION_KEY` environment overrides
//! are applied, then the whole document is validated.

mod loading;
mod tasks;
mod validation;
#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use vigil_core::{ResolutionError, TaskError};
use vigil_scheduler::{SchedulerConfig, StorageDispatcherConfig};

pub use tasks::TaskConfig;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("toml parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("config error: {0}")]
    Invalid(String),

    #[error("task #{index}: {source}")]
    Location {
        index: usize,
        source: ResolutionError,
    },

    #[error("task #{index}: {source}")]
    Task { index: usize, source: TaskError },
}

// ── Top-level config ────────────────────────────────────────────────

/// Full agent configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub agent: AgentSection,

    /// Worker pool and clock settings.
    #[serde(default)]
    pub scheduler: SchedulerConfig,

    /// Completion queue and storage batching.
    #[serde(default)]
    pub storage: StorageDispatcherConfig,

    /// Sampling tasks.
    #[serde(default)]
    pub tasks: Vec<TaskConfig>,
}

/// Identity of this agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSection {
    /// Endpoint name used for tasks that do not name one, and substituted
    /// for the managed-server placeholder in id templates.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
}

fn default_endpoint() -> String {
    "localhost".to_string()
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
        }
    }
}
