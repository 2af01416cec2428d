//! Consensus judge port
//!
//! Kept separate from [`GenerationPort`](super::generation::GenerationPort)
//! so the judge can never be one of the discussion participants.

use async_trait::async_trait;
use seminar_domain::Transcript;
use thiserror::Error;

/// Errors that can occur during a judge call
///
/// None of these abort a group: the conversation engine records the
/// failure as a no-consensus verdict and keeps going.
#[derive(Error, Debug)]
pub enum JudgeError {
    #[error("transient judge error: {0}")]
    Transient(String),

    #[error("judge call timed out")]
    Timeout,

    /// The response did not follow the YES/NO protocol
    #[error("malformed judge response: {0}")]
    Malformed(String),

    #[error("judge error: {0}")]
    Other(String),
}

/// A judge's decision about one transcript
#[derive(Debug, Clone)]
pub struct JudgeVerdict {
    pub consensus: bool,
    pub rationale: String,
}

impl JudgeVerdict {
    pub fn new(consensus: bool, rationale: impl Into<String>) -> Self {
        Self {
            consensus,
            rationale: rationale.into(),
        }
    }
}

/// Capability that decides whether a discussion has reached consensus
///
/// The adapter renders the transcript into its own prompt and parses the
/// response; the engine only sees a structured verdict or an error.
#[async_trait]
pub trait JudgePort: Send + Sync {
    async fn judge(&self, task: &str, transcript: &Transcript)
        -> Result<JudgeVerdict, JudgeError>;
}
