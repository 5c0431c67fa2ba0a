//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the analysis pipeline and its
//! collaborators. Implementations live in other crates.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Output format hint passed to the model backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Free text
    Text,
    /// Ask the backend to constrain output to a JSON object
    JsonObject,
}

/// Per-call options for a model query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryOptions {
    /// Sampling temperature
    pub temperature: Option<f32>,

    /// Maximum tokens to generate
    pub max_tokens: Option<u32>,

    /// Output format hint; backends may ignore it
    pub response_format: Option<ResponseFormat>,
}

impl QueryOptions {
    /// Options requesting JSON output
    pub fn json(temperature: f32, max_tokens: u32) -> Self {
        Self {
            temperature: Some(temperature),
            max_tokens: Some(max_tokens),
            response_format: Some(ResponseFormat::JsonObject),
        }
    }

    /// Whether JSON output was requested
    pub fn wants_json(&self) -> bool {
        self.response_format == Some(ResponseFormat::JsonObject)
    }
}

/// Trait for language model backends
///
/// Implemented by the infrastructure layer (lector-llm)
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// Error type for transport-level failures
    type Error: std::fmt::Display + Send + Sync;

    /// Send a system and user prompt, returning the model's text
    async fn query(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &QueryOptions,
    ) -> Result<String, Self::Error>;

    /// Whether the backend is reachable; informational only
    async fn check_availability(&self) -> bool;

    /// Whether several `query` calls may be outstanding at once
    fn is_concurrency_safe(&self) -> bool {
        true
    }
}

/// Plain text access to a document
///
/// Implemented by whatever ingestion layer produced the document.
pub trait DocumentText {
    /// The document's plain text
    fn plain_text(&self) -> Cow<'_, str>;

    /// Display name, when known
    fn name(&self) -> Option<&str> {
        None
    }
}

impl DocumentText for str {
    fn plain_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self)
    }
}

impl DocumentText for String {
    fn plain_text(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_query_options() {
        let options = QueryOptions::json(0.2, 2000);
        assert!(options.wants_json());
        assert_eq!(options.max_tokens, Some(2000));
        assert!(!QueryOptions::default().wants_json());
    }

    #[test]
    fn test_response_format_wire_shape() {
        let value = serde_json::to_value(ResponseFormat::JsonObject).unwrap();
        assert_eq!(value, serde_json::json!({"type": "json_object"}));
    }

    #[test]
    fn test_strings_are_documents() {
        let text = String::from("hello");
        assert_eq!(text.plain_text(), "hello");
        assert_eq!("hi".plain_text(), "hi");
        assert_eq!(text.name(), None);
    }
}
