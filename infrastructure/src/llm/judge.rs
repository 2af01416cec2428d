//! LLM-backed consensus judge

use super::client::ChatClient;
use async_trait::async_trait;
use seminar_application::{GenerationError, JudgeError, JudgePort, JudgeVerdict};
use seminar_domain::{parse_judge_response, PromptTemplate, Transcript};
use std::sync::Arc;
use tracing::debug;

/// Judge adapter rendering the transcript into the YES/NO protocol
///
/// Holds its own client so the judge model can differ from the
/// participants' model; the judge is never a discussion participant.
pub struct LlmJudge {
    client: Arc<ChatClient>,
}

impl LlmJudge {
    pub fn new(client: Arc<ChatClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl JudgePort for LlmJudge {
    async fn judge(
        &self,
        task: &str,
        transcript: &Transcript,
    ) -> Result<JudgeVerdict, JudgeError> {
        let lines = transcript.speaker_lines(|id| id.to_string());
        let prompt = PromptTemplate::judge_prompt(task, &lines);

        let response = self
            .client
            .complete(PromptTemplate::judge_system(), &prompt)
            .await
            .map_err(map_generation_error)?;

        debug!(response = %first_line(&response), "judge responded");

        match parse_judge_response(&response) {
            Some(consensus) => Ok(JudgeVerdict::new(consensus, response)),
            None => Err(JudgeError::Malformed(truncate(&response, 200))),
        }
    }
}

fn map_generation_error(e: GenerationError) -> JudgeError {
    match e {
        GenerationError::Transient(m) => JudgeError::Transient(m),
        GenerationError::Timeout => JudgeError::Timeout,
        // Quota exhaustion on the judge only costs this one check.
        GenerationError::QuotaExceeded(m) => JudgeError::Other(m),
        GenerationError::Other(m) => JudgeError::Other(m),
    }
}

fn first_line(s: &str) -> &str {
    s.lines().next().unwrap_or_default()
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        let mut end = max;
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_mapping_keeps_retryability() {
        assert!(matches!(
            map_generation_error(GenerationError::Transient("503".into())),
            JudgeError::Transient(_)
        ));
        assert!(matches!(
            map_generation_error(GenerationError::Timeout),
            JudgeError::Timeout
        ));
        assert!(matches!(
            map_generation_error(GenerationError::QuotaExceeded("429".into())),
            JudgeError::Other(_)
        ));
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let s = "私たちは合意に達しました、間違いなく";
        let out = truncate(s, 10);
        assert!(out.ends_with("..."));
        assert!(out.len() <= 14);
    }
}
