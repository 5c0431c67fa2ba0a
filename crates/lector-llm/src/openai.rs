//! OpenAI-compatible chat-completions client
//!
//! Works with any server exposing `POST /v1/chat/completions` (OpenAI,
//! LM Studio, vLLM, llama.cpp server, ...).

use crate::LlmError;
use async_trait::async_trait;
use lector_domain::{ModelClient, QueryOptions};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

/// Default base URL
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Default timeout for model requests (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Client for OpenAI-compatible chat-completion endpoints
pub struct OpenAiClient {
    client: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl OpenAiClient {
    /// Create a new client
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Communication(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Model this client talks to
    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_body(&self, system_prompt: &str, user_prompt: &str, options: &QueryOptions) -> serde_json::Value {
        let mut body = json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_prompt },
            ],
        });

        if let Some(temperature) = options.temperature {
            body["temperature"] = json!(temperature);
        }
        if let Some(max_tokens) = options.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        if let Some(format) = options.response_format {
            body["response_format"] = json!(format);
        }
        body
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }
}

#[async_trait]
impl ModelClient for OpenAiClient {
    type Error = LlmError;

    async fn query(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &QueryOptions,
    ) -> Result<String, Self::Error> {
        let url = format!("{}/v1/chat/completions", self.base_url);
        let body = self.request_body(system_prompt, user_prompt, options);

        debug!("OpenAI request to {}", url);

        let response = self
            .authorized(self.client.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimitExceeded);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(self.model.clone()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Communication(format!("HTTP {}: {}", status, body)));
        }

        let resp: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        // A null content (e.g. refusals) is treated as an empty reply
        match &resp["choices"][0]["message"]["content"] {
            serde_json::Value::String(content) => Ok(content.clone()),
            serde_json::Value::Null if resp["choices"][0].is_object() => Ok(String::new()),
            _ => Err(LlmError::InvalidResponse(
                "missing choices[0].message.content".to_string(),
            )),
        }
    }

    async fn check_availability(&self) -> bool {
        let url = format!("{}/v1/models", self.base_url);
        match self.authorized(self.client.get(&url)).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Model endpoint not reachable: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> OpenAiClient {
        OpenAiClient::new(
            "http://localhost:1234/",
            "gpt-4o-mini",
            Some("sk-test".to_string()),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_base_url_is_normalized() {
        assert_eq!(client().base_url, "http://localhost:1234");
        assert_eq!(client().model(), "gpt-4o-mini");
    }

    #[test]
    fn test_blank_api_key_is_dropped() {
        let client = OpenAiClient::new(DEFAULT_BASE_URL, "m", Some("  ".into()), Duration::from_secs(1)).unwrap();
        assert!(client.api_key.is_none());
    }

    #[test]
    fn test_request_body_with_json_hint() {
        let body = client().request_body("sys", "user", &QueryOptions::json(0.2, 2000));
        assert_eq!(body["model"], "gpt-4o-mini");
        assert_eq!(body["messages"][0]["content"], "sys");
        assert_eq!(body["messages"][1]["role"], "user");
        assert_eq!(body["max_tokens"], 2000);
        assert_eq!(body["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_request_body_omits_unset_options() {
        let body = client().request_body("s", "u", &QueryOptions::default());
        assert!(body.get("temperature").is_none());
        assert!(body.get("max_tokens").is_none());
        assert!(body.get("response_format").is_none());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint() {
        let client = OpenAiClient::new("http://127.0.0.1:9", "m", None, Duration::from_secs(2)).unwrap();
        let result = client.query("s", "u", &QueryOptions::default()).await;
        assert!(matches!(result, Err(LlmError::Communication(_))));
        assert!(!client.check_availability().await);
    }
}
