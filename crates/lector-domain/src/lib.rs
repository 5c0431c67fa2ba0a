//! Lector Domain Layer
//!
//! This crate contains the data model shared by every Lector crate: the
//! options that drive an analysis, the chunks a document is split into, the
//! per-chunk outcomes, and the result envelope handed back to callers.
//!
//! ## Key Concepts
//!
//! - **Document**: an immutable text payload plus optional name
//! - **Chunk**: a bounded, possibly overlapping slice of document text
//! - **ChunkResult**: the tagged outcome of analyzing one chunk
//! - **AnalysisResult**: the `{success, data, error, meta}` envelope every
//!   analysis returns
//!
//! ## Architecture
//!
//! - Pure data and trait definitions only
//! - Model transport lives in `lector-llm`
//! - Pipeline logic lives in `lector-analyzer`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod analysis;
pub mod analysis_id;
pub mod chunk;
pub mod document;
pub mod envelope;
pub mod traits;

// Re-exports for convenience
pub use analysis::{AnalysisOptions, AnalysisType, SummaryFormat};
pub use analysis_id::AnalysisId;
pub use chunk::{Chunk, ChunkOutcome, ChunkResult};
pub use document::Document;
pub use envelope::{AnalysisMeta, AnalysisResult, SynthesisMode};
pub use traits::{DocumentText, ModelClient, QueryOptions, ResponseFormat};

/// A free-form JSON object as produced by the model
pub type StructuredData = serde_json::Map<String, serde_json::Value>;
