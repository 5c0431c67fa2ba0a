//! Lector Model Client Layer
//!
//! Pluggable language-model backends implementing the `ModelClient` trait
//! from `lector-domain`.
//!
//! # Clients
//!
//! - `MockClient`: Deterministic scripted client for testing
//! - `OllamaClient`: Local Ollama chat API
//! - `OpenAiClient`: Any OpenAI-compatible chat-completions endpoint
//!
//! # Examples
//!
//! ```
//! use lector_llm::MockClient;
//! use lector_domain::{ModelClient, QueryOptions};
//!
//! # tokio_test::block_on(async {
//! let client = MockClient::new(r#"{"title": "Hello"}"#);
//! let reply = client.query("system", "user", &QueryOptions::default()).await.unwrap();
//! assert_eq!(reply, r#"{"title": "Hello"}"#);
//! # });
//! ```

#![warn(missing_docs)]

pub mod ollama;
pub mod openai;

use async_trait::async_trait;
use lector_domain::{ModelClient, QueryOptions};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

pub use ollama::OllamaClient;
pub use openai::OpenAiClient;

/// Errors that can occur during model calls
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from the backend
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// A scripted reply
#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Error,
}

#[derive(Debug, Clone)]
struct MockRule {
    needle: String,
    reply: MockReply,
    delay: Option<Duration>,
}

/// One recorded `query` call
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    /// System prompt sent
    pub system_prompt: String,
    /// User prompt sent
    pub user_prompt: String,
    /// Options sent
    pub options: QueryOptions,
}

/// Mock model client for deterministic testing
///
/// Replies are chosen by the first rule whose needle occurs in the system or
/// user prompt, falling back to a default reply. Clones share rules, the call
/// log and counters.
///
/// # Examples
///
/// ```
/// use lector_llm::MockClient;
/// use lector_domain::{ModelClient, QueryOptions};
///
/// # tokio_test::block_on(async {
/// let client = MockClient::new("fallback");
/// client.respond_when("part 2 of 3", r#"{"n": 2}"#);
/// client.fail_when("part 3 of 3");
///
/// let opts = QueryOptions::default();
/// assert_eq!(client.query("sys", "chunk (part 2 of 3)", &opts).await.unwrap(), r#"{"n": 2}"#);
/// assert!(client.query("sys", "chunk (part 3 of 3)", &opts).await.is_err());
/// assert_eq!(client.query("sys", "anything", &opts).await.unwrap(), "fallback");
/// assert_eq!(client.call_count(), 3);
/// # });
/// ```
#[derive(Debug, Clone)]
pub struct MockClient {
    default_response: String,
    rules: Arc<Mutex<Vec<MockRule>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    available: Arc<AtomicBool>,
    concurrency_safe: bool,
    in_flight: Arc<AtomicUsize>,
    peak_in_flight: Arc<AtomicUsize>,
}

impl MockClient {
    /// Create a new MockClient with a fixed reply for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            rules: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            available: Arc::new(AtomicBool::new(true)),
            concurrency_safe: true,
            in_flight: Arc::new(AtomicUsize::new(0)),
            peak_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Declare whether concurrent calls are allowed
    pub fn with_concurrency_safe(mut self, safe: bool) -> Self {
        self.concurrency_safe = safe;
        self
    }

    /// Reply with `response` when either prompt contains `needle`
    pub fn respond_when(&self, needle: impl Into<String>, response: impl Into<String>) {
        self.push_rule(needle.into(), MockReply::Text(response.into()), None);
    }

    /// Like `respond_when`, but the reply arrives after `delay`
    pub fn respond_after(
        &self,
        needle: impl Into<String>,
        response: impl Into<String>,
        delay: Duration,
    ) {
        self.push_rule(needle.into(), MockReply::Text(response.into()), Some(delay));
    }

    /// Fail with a transport error when either prompt contains `needle`
    pub fn fail_when(&self, needle: impl Into<String>) {
        self.push_rule(needle.into(), MockReply::Error, None);
    }

    /// Toggle what `check_availability` reports
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Get the number of times query was called
    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// All recorded calls in arrival order
    pub fn calls(&self) -> Vec<RecordedCall> {
        lock(&self.calls).clone()
    }

    /// Highest number of calls that were outstanding at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Reset the call log
    pub fn reset_calls(&self) {
        lock(&self.calls).clear();
    }

    fn push_rule(&self, needle: String, reply: MockReply, delay: Option<Duration>) {
        lock(&self.rules).push(MockRule { needle, reply, delay });
    }

    fn select(&self, system_prompt: &str, user_prompt: &str) -> (MockReply, Option<Duration>) {
        lock(&self.rules)
            .iter()
            .find(|rule| system_prompt.contains(&rule.needle) || user_prompt.contains(&rule.needle))
            .map(|rule| (rule.reply.clone(), rule.delay))
            .unwrap_or_else(|| (MockReply::Text(self.default_response.clone()), None))
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

#[async_trait]
impl ModelClient for MockClient {
    type Error = LlmError;

    async fn query(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &QueryOptions,
    ) -> Result<String, Self::Error> {
        lock(&self.calls).push(RecordedCall {
            system_prompt: system_prompt.to_string(),
            user_prompt: user_prompt.to_string(),
            options: options.clone(),
        });

        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        let (reply, delay) = self.select(system_prompt, user_prompt);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        } else {
            // Give sibling calls a chance to start
            tokio::task::yield_now().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        match reply {
            MockReply::Text(text) => Ok(text),
            MockReply::Error => Err(LlmError::Other("Mock error".to_string())),
        }
    }

    async fn check_availability(&self) -> bool {
        self.available.load(Ordering::SeqCst)
    }

    fn is_concurrency_safe(&self) -> bool {
        self.concurrency_safe
    }
}

/// Lock a mutex, recovering the data if a holder panicked
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
