//! Configuration file loading for seminar
//!
//! Raw TOML structures live in [`file_config`]; [`loader`] merges the
//! config sources (defaults, global file, project file, explicit path)
//! with figment.

pub mod file_config;
pub mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileDatabaseConfig, FileModelConfig, FileRosterConfig,
    FileSimulationConfig,
};
pub use loader::ConfigLoader;
