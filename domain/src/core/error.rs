//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("group {group} is not active (status: {status})")]
    GroupNotActive { group: i64, status: String },

    #[error("group {group} cannot be commented from status {status}")]
    NotReadyForComment { group: i64, status: String },

    #[error("message sequence out of order: expected {expected}, got {got}")]
    SequenceGap { expected: u32, got: u32 },

    #[error("message belongs to group {got}, transcript is for group {expected}")]
    ForeignMessage { expected: i64, got: i64 },

    #[error("persona {persona} is not in the roster")]
    UnknownPersona { persona: String },

    #[error("roster is empty")]
    EmptyRoster,

    #[error("group size must be at least 1")]
    InvalidGroupSize,

    #[error("operation cancelled")]
    Cancelled,
}

impl DomainError {
    /// Check if this error represents a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, DomainError::Cancelled)
    }
}
