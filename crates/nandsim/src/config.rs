//! Run configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SimError;

/// How a launched simulation runs.
///
/// Every field has a default, so a config file only needs to mention what
/// it changes:
///
/// ```json
/// { "step_interval_ms": 250, "log_path": "run.log" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Milliseconds between step ticks.
    pub step_interval_ms: u64,
    /// Step log destination. Created or truncated at launch.
    pub log_path: PathBuf,
}

impl RunConfig {
    pub const DEFAULT_STEP_INTERVAL_MS: u64 = 1000;
    pub const DEFAULT_LOG_PATH: &str = "nandsim.log";

    pub fn from_json(text: &str) -> Result<Self, SimError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_step_interval_ms(mut self, step_interval_ms: u64) -> Self {
        self.step_interval_ms = step_interval_ms;
        self
    }

    pub fn with_log_path(mut self, log_path: impl Into<PathBuf>) -> Self {
        self.log_path = log_path.into();
        self
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.step_interval_ms == 0 {
            return Err(SimError::InvalidConfig(
                "step_interval_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            step_interval_ms: Self::DEFAULT_STEP_INTERVAL_MS,
            log_path: PathBuf::from(Self::DEFAULT_LOG_PATH),
        }
    }
}
