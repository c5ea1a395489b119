use std::path::Path;

use vigil_core::Task;

use super::{AgentConfig, ConfigError, TaskConfig};

impl AgentConfig {
    /// Parse config from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let mut config: Self = toml::from_str(toml_str)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load config from a file path.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Configuration used when no file is given: defaults, environment
    /// overrides and the host platform task set.
    pub fn platform_defaults() -> Result<Self, ConfigError> {
        let mut config = Self {
            tasks: TaskConfig::platform_defaults(),
            ..Self::default()
        };
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Build every configured task, in declaration order.
    pub fn build_tasks(&self) -> Result<Vec<Task>, ConfigError> {
        self.tasks
            .iter()
            .enumerate()
            .map(|(index, task)| task.build(index, &self.agent))
            .collect()
    }

    // ── Environment variable overrides ──────────────────────────────

    /// Apply environment variable overrides.
    ///
    /// Convention: `VIGIL_SECTION_KEY` overrides `section.key`, e.g.
    /// `VIGIL_SCHEDULER_WORKER_THREADS` -> `scheduler.worker_threads`.
    /// Values that do not parse are ignored.
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("VIGIL_AGENT_ENDPOINT") {
            self.agent.endpoint = v;
        }
        override_parsed("VIGIL_SCHEDULER_WORKER_THREADS", &mut self.scheduler.worker_threads);
        override_parsed("VIGIL_SCHEDULER_TICK_MILLIS", &mut self.scheduler.tick_millis);
        override_parsed(
            "VIGIL_SCHEDULER_SHUTDOWN_TIMEOUT_SECONDS",
            &mut self.scheduler.shutdown_timeout_seconds,
        );
        override_parsed(
            "VIGIL_SCHEDULER_DIAGNOSTICS_INTERVAL_SECONDS",
            &mut self.scheduler.diagnostics_interval_seconds,
        );
        override_parsed("VIGIL_STORAGE_BUFFER_SIZE", &mut self.storage.buffer_size);
        override_parsed("VIGIL_STORAGE_MAX_BATCH_SIZE", &mut self.storage.max_batch_size);
        override_parsed("VIGIL_STORAGE_MAX_WAIT_MILLIS", &mut self.storage.max_wait_millis);
    }
}

fn override_parsed<T: std::str::FromStr>(key: &str, target: &mut T) {
    if let Some(value) = std::env::var(key).ok().and_then(|v| v.parse().ok()) {
        *target = value;
    }
}
