use std::collections::HashSet;

use super::{AgentConfig, ConfigError};

impl AgentConfig {
    /// Validate the config: numeric bounds, duplicate task ids and every
    /// task definition.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_agent()?;
        self.validate_limits()?;
        self.validate_tasks()?;
        Ok(())
    }

    fn validate_agent(&self) -> Result<(), ConfigError> {
        if self.agent.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("agent.endpoint must not be empty".into()));
        }
        Ok(())
    }

    fn validate_limits(&self) -> Result<(), ConfigError> {
        if self.scheduler.tick_millis == 0 {
            return Err(ConfigError::Invalid("scheduler.tick_millis must be > 0".into()));
        }
        if self.storage.buffer_size == 0 {
            return Err(ConfigError::Invalid("storage.buffer_size must be > 0".into()));
        }
        if self.storage.max_batch_size == 0 {
            return Err(ConfigError::Invalid("storage.max_batch_size must be > 0".into()));
        }
        Ok(())
    }

    /// Builds every task once so construction errors surface at load time.
    fn validate_tasks(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for task in self.build_tasks()? {
            if !seen.insert(task.id().to_string()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate task id '{}'",
                    task.id()
                )));
            }
        }
        Ok(())
    }
}
