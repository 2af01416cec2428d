//! Generation port
//!
//! Defines the interface for producing utterances, commentary and
//! evaluation text from an LLM provider.

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during a generation call
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Network-level or provider-side transient failure; safe to retry
    #[error("transient generation error: {0}")]
    Transient(String),

    /// The provider reported an exhausted quota; retrying will not help
    #[error("generation quota exceeded: {0}")]
    QuotaExceeded(String),

    /// The per-call timeout elapsed
    #[error("generation call timed out")]
    Timeout,

    #[error("generation error: {0}")]
    Other(String),
}

impl GenerationError {
    /// Whether retrying this call with backoff can succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, GenerationError::Transient(_) | GenerationError::Timeout)
    }
}

/// Capability that produces the next piece of text for a given context
///
/// `system_prompt` carries the speaker's identity (a persona's behavioral
/// prompt, the teacher commentator role, the evaluator role); `prompt`
/// carries the rendered transcript and instructions. Implementations
/// (adapters) live in the infrastructure layer.
#[async_trait]
pub trait GenerationPort: Send + Sync {
    async fn generate(&self, system_prompt: &str, prompt: &str)
        -> Result<String, GenerationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(GenerationError::Transient("503".into()).is_transient());
        assert!(GenerationError::Timeout.is_transient());
        assert!(!GenerationError::QuotaExceeded("429".into()).is_transient());
        assert!(!GenerationError::Other("bad request".into()).is_transient());
    }
}
