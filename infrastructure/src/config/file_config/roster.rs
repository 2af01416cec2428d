//! Roster configuration from TOML (`[roster]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Persona and lesson-plan file locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileRosterConfig {
    pub personas: PathBuf,
    pub lesson_plans: PathBuf,
    /// Cap on how many personas join the run; `None` takes all of them
    pub persona_limit: Option<usize>,
}

impl Default for FileRosterConfig {
    fn default() -> Self {
        Self {
            personas: PathBuf::from("personas.json"),
            lesson_plans: PathBuf::from("lesson_plans.json"),
            persona_limit: Some(30),
        }
    }
}
