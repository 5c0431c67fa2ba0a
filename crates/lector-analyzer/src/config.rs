//! Configuration for the Analyzer

use lector_domain::AnalysisOptions;
use serde::{Deserialize, Serialize};

/// Configuration for the Analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Maximum input text length (characters)
    pub max_text_length: usize,

    /// Per-chunk cap on generated tokens, independent of the document budget
    pub chunk_max_tokens: u32,

    /// Cap on generated tokens for the merge call
    pub synthesis_max_tokens: u32,

    /// Characters of the document shown to the merge call
    pub preview_chars: usize,

    /// Maximum chunk analyses in flight at once (0 = all chunks)
    pub max_concurrent_chunks: usize,

    /// Control-character density above which text is treated as binary
    pub binary_threshold: f64,

    /// Options used when a caller supplies none
    pub defaults: AnalysisOptions,
}

impl AnalyzerConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_text_length == 0 {
            return Err("max_text_length must be greater than 0".to_string());
        }
        if self.chunk_max_tokens == 0 {
            return Err("chunk_max_tokens must be greater than 0".to_string());
        }
        if self.synthesis_max_tokens == 0 {
            return Err("synthesis_max_tokens must be greater than 0".to_string());
        }
        if !(self.binary_threshold > 0.0 && self.binary_threshold <= 1.0) {
            return Err("binary_threshold must be within (0, 1]".to_string());
        }
        if self.defaults.max_chunk_size > self.max_text_length {
            return Err("defaults.maxChunkSize cannot exceed max_text_length".to_string());
        }
        self.defaults
            .validate()
            .map_err(|e| format!("defaults: {}", e))
    }

    /// Effective concurrency for `chunk_count` chunks
    pub fn concurrency_for(&self, chunk_count: usize) -> usize {
        match self.max_concurrent_chunks {
            0 => chunk_count.max(1),
            n => n.min(chunk_count.max(1)),
        }
    }
}

impl Default for AnalyzerConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            max_text_length: 2_000_000,
            chunk_max_tokens: 2000,
            synthesis_max_tokens: 4000,
            preview_chars: 500,
            max_concurrent_chunks: 8,
            binary_threshold: 0.10,
            defaults: AnalysisOptions::default(),
        }
    }
}

impl AnalyzerConfig {
    /// Fast preset: smaller chunks and token budgets, wide fan-out
    pub fn fast() -> Self {
        Self {
            chunk_max_tokens: 1000,
            synthesis_max_tokens: 2000,
            preview_chars: 300,
            max_concurrent_chunks: 16,
            defaults: AnalysisOptions {
                max_chunk_size: 3000,
                overlap_size: 100,
                max_tokens: 2000,
                ..AnalysisOptions::default()
            },
            ..Self::default()
        }
    }

    /// Thorough preset: larger chunks with more context, gentle on the backend
    pub fn thorough() -> Self {
        Self {
            synthesis_max_tokens: 8000,
            preview_chars: 1000,
            max_concurrent_chunks: 2,
            defaults: AnalysisOptions {
                max_chunk_size: 8000,
                overlap_size: 400,
                max_tokens: 8000,
                ..AnalysisOptions::default()
            },
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}
