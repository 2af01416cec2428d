//! Simulation configuration from TOML (`[simulation]` section)
//!
//! Example configuration:
//!
//! ```toml
//! [simulation]
//! group_size = 6
//! max_turns_per_group = 24
//! consensus_check_interval = "round"   # or a turn count, e.g. "3"
//! concurrency_limit = 3
//! retry_attempts = 3
//! retry_backoff_ms = 500
//! call_timeout_secs = 120
//! ```

use super::ConfigValidationError;
use seminar_application::{RetryPolicy, SimulationParams};
use seminar_domain::CheckCadence;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Simulation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSimulationConfig {
    /// Personas per group
    pub group_size: usize,
    /// Turn cap before a group times out
    pub max_turns_per_group: u32,
    /// `"round"` or a number of turns between judge calls
    pub consensus_check_interval: String,
    /// Maximum groups discussing in parallel
    pub concurrency_limit: usize,
    /// Attempts per external call (including the first)
    pub retry_attempts: u32,
    /// Delay before the first retry; doubles per attempt
    pub retry_backoff_ms: u64,
    /// Per-call timeout for generation and judge calls
    pub call_timeout_secs: u64,
}

impl Default for FileSimulationConfig {
    fn default() -> Self {
        Self {
            group_size: 6,
            max_turns_per_group: 24,
            consensus_check_interval: "round".to_string(),
            concurrency_limit: 3,
            retry_attempts: 3,
            retry_backoff_ms: 500,
            call_timeout_secs: 120,
        }
    }
}

impl FileSimulationConfig {
    /// Parse the cadence string into the domain type
    pub fn parse_check_interval(&self) -> Result<CheckCadence, ConfigValidationError> {
        self.consensus_check_interval.parse().map_err(|message| {
            ConfigValidationError::InvalidSimulationValue {
                field: "consensus_check_interval".to_string(),
                message,
            }
        })
    }

    /// Build [`SimulationParams`] from the raw values
    pub fn to_params(&self) -> Result<SimulationParams, ConfigValidationError> {
        if self.group_size == 0 {
            return Err(ConfigValidationError::InvalidSimulationValue {
                field: "group_size".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.max_turns_per_group == 0 {
            return Err(ConfigValidationError::InvalidSimulationValue {
                field: "max_turns_per_group".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        Ok(SimulationParams::default()
            .with_group_size(self.group_size)
            .with_max_turns(self.max_turns_per_group)
            .with_check_interval(self.parse_check_interval()?)
            .with_concurrency_limit(self.concurrency_limit)
            .with_retry(RetryPolicy::new(
                self.retry_attempts,
                Duration::from_millis(self.retry_backoff_ms),
            ))
            .with_call_timeout(Duration::from_secs(self.call_timeout_secs)))
    }
}
