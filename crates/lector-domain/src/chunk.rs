//! Chunks and per-chunk analysis outcomes

use crate::StructuredData;
use serde::{Deserialize, Serialize};

/// A contiguous slice of document text submitted to the model as one request
///
/// `start` and `end` are character offsets (Unicode scalar values) into the
/// original text, end-exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// 0-based sequence index
    pub index: usize,
    /// Start offset in characters, inclusive
    pub start: usize,
    /// End offset in characters, exclusive
    pub end: usize,
    /// The chunk text
    pub text: String,
}

impl Chunk {
    /// Length of the chunk in characters
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

/// Outcome of analyzing a single chunk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ChunkOutcome {
    /// The model produced a JSON object
    Ok {
        /// The parsed object
        data: StructuredData,
        /// Whether the object was only obtained after repair
        repaired: bool,
    },
    /// The chunk could not be turned into structured data
    Failed {
        /// Human-readable reason
        error: String,
        /// Raw model text, kept for diagnosis
        raw: String,
    },
}

/// Tagged outcome of analyzing one chunk, keyed by its sequence index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkResult {
    /// Index of the analyzed chunk
    pub index: usize,
    /// What happened
    #[serde(flatten)]
    pub outcome: ChunkOutcome,
}

impl ChunkResult {
    /// Successful outcome
    pub fn ok(index: usize, data: StructuredData, repaired: bool) -> Self {
        Self {
            index,
            outcome: ChunkOutcome::Ok { data, repaired },
        }
    }

    /// Failed outcome
    pub fn failed(index: usize, error: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            index,
            outcome: ChunkOutcome::Failed {
                error: error.into(),
                raw: raw.into(),
            },
        }
    }

    /// Whether the chunk produced data
    pub fn is_ok(&self) -> bool {
        matches!(self.outcome, ChunkOutcome::Ok { .. })
    }

    /// The structured data, if any
    pub fn data(&self) -> Option<&StructuredData> {
        match &self.outcome {
            ChunkOutcome::Ok { data, .. } => Some(data),
            ChunkOutcome::Failed { .. } => None,
        }
    }

    /// The failure reason, if any
    pub fn error(&self) -> Option<&str> {
        match &self.outcome {
            ChunkOutcome::Ok { .. } => None,
            ChunkOutcome::Failed { error, .. } => Some(error),
        }
    }
}
