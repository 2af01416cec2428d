//! Infrastructure layer for seminar
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer, including configuration file loading.

pub mod config;
pub mod llm;
pub mod persistence;
pub mod roster;

// Re-export commonly used types
pub use config::{ConfigLoader, ConfigValidationError, FileConfig};
pub use llm::{ChatClient, ChatClientConfig, LlmJudge};
pub use persistence::SqliteStore;
pub use roster::{sanitize_persona_id, RosterError, RosterLoader};
