//! Error types for the Analyzer

use thiserror::Error;

/// Errors that can occur during analysis
///
/// None of these cross the pipeline boundary as-is: `analyze_document`
/// turns them into a failed envelope.
#[derive(Error, Debug)]
pub enum AnalyzerError {
    /// Model transport error
    #[error("LLM request failed: {0}")]
    Llm(String),

    /// Options or input rejected before any model call
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Document looks like binary data
    #[error("Document appears to be binary content ({0}); extract its text before analysis")]
    BinaryContent(String),

    /// Nothing left to analyze after cleaning
    #[error("Document contains no analyzable text")]
    EmptyDocument,

    /// Every chunk failed; carries the reason reported to the caller
    #[error("{0}")]
    NoUsableResults(String),

    /// Text exceeds maximum length
    #[error("Text too long: {0} chars (max: {1})")]
    TextTooLong(usize, usize),

    /// JSON parsing error
    #[error("JSON parse error: {0}")]
    JsonParse(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<serde_json::Error> for AnalyzerError {
    fn from(e: serde_json::Error) -> Self {
        AnalyzerError::JsonParse(e.to_string())
    }
}
