//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly; parsing into domain/application types
//! happens through the `parse_*` / `simulation_params` methods so a bad
//! value surfaces as a [`ConfigValidationError`], not a panic.

mod database;
mod model;
mod roster;
mod simulation;

pub use database::FileDatabaseConfig;
pub use model::FileModelConfig;
pub use roster::FileRosterConfig;
pub use simulation::FileSimulationConfig;

use seminar_application::SimulationParams;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors for invalid configuration values
#[derive(Error, Debug)]
pub enum ConfigValidationError {
    #[error("simulation.{field}: {message}")]
    InvalidSimulationValue { field: String, message: String },

    #[error("model.api_key_env: environment variable {0} is not set")]
    MissingApiKey(String),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Group sizing, stopping and concurrency settings
    pub simulation: FileSimulationConfig,
    /// Database location
    pub database: FileDatabaseConfig,
    /// Generation endpoint settings
    pub model: FileModelConfig,
    /// Persona and lesson-plan file locations
    pub roster: FileRosterConfig,
}

impl FileConfig {
    /// Build the application-layer parameters from the raw values.
    pub fn simulation_params(&self) -> Result<SimulationParams, ConfigValidationError> {
        self.simulation.to_params()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_parses() {
        let config = FileConfig::default();
        let params = config.simulation_params().unwrap();
        assert_eq!(params.group_size, 6);
        assert_eq!(params.max_turns_per_group, 24);
    }

    #[test]
    fn test_full_toml_round_trip() {
        let toml_str = r#"
[simulation]
group_size = 4
max_turns_per_group = 12
consensus_check_interval = "2"
concurrency_limit = 5
retry_attempts = 4
retry_backoff_ms = 250
call_timeout_secs = 60

[database]
url = "sqlite:./runs/classroom.db"

[model]
endpoint = "http://localhost:11434/v1"
name = "llama3"
api_key_env = "LOCAL_KEY"
temperature = 0.5
max_tokens = 256

[roster]
personas = "students.json"
lesson_plans = "plans.json"
persona_limit = 12
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.database.url, "sqlite:./runs/classroom.db");
        assert_eq!(config.model.name, "llama3");
        assert_eq!(config.roster.persona_limit, Some(12));

        let params = config.simulation_params().unwrap();
        assert_eq!(params.group_size, 4);
        assert_eq!(params.concurrency_limit, 5);
        assert_eq!(params.retry.max_attempts, 4);
        assert_eq!(params.call_timeout.as_secs(), 60);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let toml_str = r#"
[simulation]
group_size = 3
"#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        let params = config.simulation_params().unwrap();
        assert_eq!(params.group_size, 3);
        assert_eq!(params.max_turns_per_group, 24);
        assert_eq!(config.model.api_key_env, "OPENAI_API_KEY");
    }
}
