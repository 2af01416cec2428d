//! OpenAI-compatible chat-completion client

use async_trait::async_trait;
use seminar_application::{GenerationError, GenerationPort};
use serde_json::Value;
use tracing::debug;

/// Connection settings for the chat-completion endpoint
#[derive(Debug, Clone)]
pub struct ChatClientConfig {
    /// Base URL, e.g. `https://api.openai.com/v1`
    pub endpoint: String,
    /// Model name sent with every request
    pub model: String,
    pub api_key: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// HTTP adapter for [`GenerationPort`]
pub struct ChatClient {
    http: reqwest::Client,
    config: ChatClientConfig,
}

impl ChatClient {
    pub fn new(config: ChatClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// One chat completion: system + user message, single choice back.
    pub async fn complete(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, GenerationError> {
        let url = format!(
            "{}/chat/completions",
            self.config.endpoint.trim_end_matches('/')
        );

        let request_body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system_prompt},
                {"role": "user", "content": user_prompt}
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens
        });

        debug!(model = %self.config.model, "chat completion request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout
                } else {
                    GenerationError::Transient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_http_failure(status, body));
        }

        let resp_json: Value = response
            .json()
            .await
            .map_err(|e| GenerationError::Other(format!("invalid response body: {}", e)))?;

        resp_json["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                GenerationError::Other("response carried no message content".to_string())
            })
    }
}

/// Map an HTTP failure status onto the generation error taxonomy.
///
/// 429 is quota exhaustion (fatal for the call), 5xx and 408 are
/// transient, everything else is a permanent request error.
fn classify_http_failure(status: reqwest::StatusCode, body: String) -> GenerationError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        GenerationError::QuotaExceeded(format!("{}: {}", status, body))
    } else if status.is_server_error() || status == reqwest::StatusCode::REQUEST_TIMEOUT {
        GenerationError::Transient(format!("{}: {}", status, body))
    } else {
        GenerationError::Other(format!("{}: {}", status, body))
    }
}

#[async_trait]
impl GenerationPort for ChatClient {
    async fn generate(
        &self,
        system_prompt: &str,
        prompt: &str,
    ) -> Result<String, GenerationError> {
        self.complete(system_prompt, prompt).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_quota_status_is_fatal_for_the_call() {
        let e = classify_http_failure(StatusCode::TOO_MANY_REQUESTS, "rate limited".into());
        assert!(matches!(e, GenerationError::QuotaExceeded(_)));
        assert!(!e.is_transient());
    }

    #[test]
    fn test_server_errors_are_transient() {
        for status in [
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::BAD_GATEWAY,
            StatusCode::SERVICE_UNAVAILABLE,
            StatusCode::REQUEST_TIMEOUT,
        ] {
            let e = classify_http_failure(status, String::new());
            assert!(e.is_transient(), "{} should be transient", status);
        }
    }

    #[test]
    fn test_client_errors_are_permanent() {
        let e = classify_http_failure(StatusCode::BAD_REQUEST, "bad payload".into());
        assert!(matches!(e, GenerationError::Other(_)));
    }
}
