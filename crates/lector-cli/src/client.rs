//! Model client selected by the active profile.

use crate::config::{Profile, Provider};
use crate::error::Result;
use async_trait::async_trait;
use lector_domain::{ModelClient, QueryOptions};
use lector_llm::{LlmError, OllamaClient, OpenAiClient};
use std::time::Duration;

/// One of the HTTP backends, chosen at runtime.
pub enum ProfileClient {
    /// Ollama backend
    Ollama(OllamaClient),
    /// OpenAI-compatible backend
    OpenAi(OpenAiClient),
}

impl ProfileClient {
    /// Build the client described by `profile`.
    pub fn from_profile(profile: &Profile, api_key: Option<&str>) -> Result<Self> {
        let timeout = Duration::from_secs(profile.timeout_secs.max(1));
        let client = match profile.provider {
            Provider::Ollama => Self::Ollama(OllamaClient::with_timeout(
                profile.base_url.as_str(),
                profile.model.as_str(),
                timeout,
            )?),
            Provider::OpenAi => Self::OpenAi(OpenAiClient::new(
                profile.base_url.as_str(),
                profile.model.as_str(),
                profile.api_key(api_key),
                timeout,
            )?),
        };
        Ok(client)
    }

    /// Model name.
    pub fn model(&self) -> &str {
        match self {
            Self::Ollama(client) => client.model(),
            Self::OpenAi(client) => client.model(),
        }
    }
}

#[async_trait]
impl ModelClient for ProfileClient {
    type Error = LlmError;

    async fn query(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &QueryOptions,
    ) -> std::result::Result<String, Self::Error> {
        match self {
            Self::Ollama(client) => client.query(system_prompt, user_prompt, options).await,
            Self::OpenAi(client) => client.query(system_prompt, user_prompt, options).await,
        }
    }

    async fn check_availability(&self) -> bool {
        match self {
            Self::Ollama(client) => client.check_availability().await,
            Self::OpenAi(client) => client.check_availability().await,
        }
    }
}
