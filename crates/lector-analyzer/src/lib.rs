//! Lector Analyzer
//!
//! Turns a document into one structured JSON analysis using a language model.
//!
//! # Overview
//!
//! Documents larger than a single model request are split into overlapping
//! chunks. Each chunk is analyzed independently and concurrently; the
//! ordered chunk results are then merged into one document-level result.
//! Every run returns the same `{success, data, error, meta}` envelope,
//! whatever went wrong along the way.
//!
//! # Architecture
//!
//! ```text
//! Document → sanitize → TextChunker → ChunkAnalyzer (fan-out) → Synthesizer → AnalysisResult
//!                                          ↓
//!                                   ModelClient + repair
//! ```
//!
//! # Key Features
//!
//! - **Binary screening**: signatures and control-character density are
//!   checked before any model call
//! - **Boundary-aware chunking**: cuts prefer paragraph and sentence breaks
//! - **JSON recovery**: prose-wrapped or near-valid model output is
//!   extracted and repaired
//! - **Graceful degradation**: failed chunks are reported, not fatal, and a
//!   failed merge call falls back to a deterministic combiner
//!
//! # Example Usage
//!
//! ```no_run
//! use lector_analyzer::{Analyzer, AnalyzerConfig};
//! use lector_domain::AnalysisType;
//! use lector_llm::MockClient;
//!
//! # async fn example() {
//! let client = MockClient::new(r#"{"title": "Quarterly report"}"#);
//! let analyzer = Analyzer::new(client, AnalyzerConfig::default());
//!
//! let result = analyzer
//!     .analyze_document("Revenue grew 12% in Q3.", Some(AnalysisType::General), None)
//!     .await;
//!
//! if result.success {
//!     println!("{}", serde_json::to_string_pretty(&result.data).unwrap());
//! } else {
//!     eprintln!("Analysis failed: {}", result.error.unwrap_or_default());
//! }
//! # }
//! ```

#![warn(missing_docs)]

mod error;
mod config;
pub mod chunking;
pub mod repair;
pub mod sanitize;
mod prompt;
mod chunk_analyzer;
mod synthesizer;
mod pipeline;

#[cfg(test)]
mod tests;

pub use error::AnalyzerError;
pub use config::AnalyzerConfig;
pub use chunking::{ChunkIter, TextChunker};
pub use repair::{extract, extract_and_parse, ParsedResponse};
pub use prompt::PromptBuilder;
pub use chunk_analyzer::{interpret_response, ChunkAnalyzer, EMPTY_RESPONSE, PARSE_FAILED};
pub use synthesizer::{combine, Synthesis, Synthesizer, NO_VALID_RESULTS};
pub use pipeline::Analyzer;
