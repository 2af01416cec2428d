//! Model configuration from TOML (`[model]` section)
//!
//! The API key itself never lives in the file; the config names the
//! environment variable that carries it.

use super::ConfigValidationError;
use crate::llm::ChatClientConfig;
use serde::{Deserialize, Serialize};

/// Generation endpoint settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileModelConfig {
    /// OpenAI-compatible base URL
    pub endpoint: String,
    /// Model name
    pub name: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for FileModelConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.openai.com/v1".to_string(),
            name: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.7,
            max_tokens: 512,
        }
    }
}

impl FileModelConfig {
    /// Resolve the API key and build the client configuration
    pub fn to_client_config(&self) -> Result<ChatClientConfig, ConfigValidationError> {
        let api_key = std::env::var(&self.api_key_env)
            .map_err(|_| ConfigValidationError::MissingApiKey(self.api_key_env.clone()))?;

        Ok(ChatClientConfig {
            endpoint: self.endpoint.clone(),
            model: self.name.clone(),
            api_key,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        })
    }
}
