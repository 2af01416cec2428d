//! Database configuration from TOML (`[database]` section)

use serde::{Deserialize, Serialize};

/// Database location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDatabaseConfig {
    /// SQLite URL or path, e.g. `sqlite:data/seminar.db`
    pub url: String,
}

impl Default for FileDatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:data/seminar.db".to_string(),
        }
    }
}
