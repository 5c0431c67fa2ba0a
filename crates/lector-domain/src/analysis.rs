//! Analysis kinds and the options that drive them

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The kind of structured analysis requested from the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisType {
    /// General insight extraction (title, summary, key points, topics)
    #[default]
    General,
    /// Named entity extraction
    Entities,
    /// Length- and format-constrained summary
    Summary,
}

impl AnalysisType {
    /// Lowercase name used on the wire and in prompts
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisType::General => "general",
            AnalysisType::Entities => "entities",
            AnalysisType::Summary => "summary",
        }
    }
}

impl fmt::Display for AnalysisType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AnalysisType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(AnalysisType::General),
            "entities" => Ok(AnalysisType::Entities),
            "summary" => Ok(AnalysisType::Summary),
            other => Err(format!("Unknown analysis type: {}", other)),
        }
    }
}

/// Output shape requested for summaries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SummaryFormat {
    /// Flowing prose
    #[default]
    Paragraph,
    /// A flat list of bullet points
    Bullets,
    /// A hierarchical outline
    Outline,
}

impl SummaryFormat {
    /// Prompt fragment describing the format
    pub fn instruction(&self) -> &'static str {
        match self {
            SummaryFormat::Paragraph => "Write the summary as one or more cohesive paragraphs of prose.",
            SummaryFormat::Bullets => "Write the summary as a list of concise bullet points, one idea per bullet, joined with newlines and prefixed with \"- \".",
            SummaryFormat::Outline => "Write the summary as a hierarchical outline with numbered sections and indented sub-points.",
        }
    }
}

/// Options controlling chunking, model sampling, and type-specific prompts
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisOptions {
    /// Maximum chunk size in characters
    pub max_chunk_size: usize,

    /// Overlap between consecutive chunks in characters
    pub overlap_size: usize,

    /// Analysis type carried with the options (the explicit argument wins)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_type: Option<AnalysisType>,

    /// Sampling temperature passed to the model
    pub temperature: f32,

    /// Document-level token budget
    pub max_tokens: u32,

    /// Entity types to extract (entities analysis)
    pub entity_types: Vec<String>,

    /// Maximum summary length in words (summary analysis)
    pub max_length: usize,

    /// Summary output format (summary analysis)
    pub format: SummaryFormat,
}

/// Entity types used when none are configured
pub const DEFAULT_ENTITY_TYPES: [&str; 5] = ["person", "organization", "location", "date", "concept"];

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            max_chunk_size: 4000,
            overlap_size: 200,
            analysis_type: None,
            temperature: 0.3,
            max_tokens: 4000,
            entity_types: DEFAULT_ENTITY_TYPES.iter().map(|s| s.to_string()).collect(),
            max_length: 500,
            format: SummaryFormat::Paragraph,
        }
    }
}

impl AnalysisOptions {
    /// Validate the options
    pub fn validate(&self) -> Result<(), String> {
        if self.max_chunk_size == 0 {
            return Err("maxChunkSize must be greater than 0".to_string());
        }
        if self.overlap_size >= self.max_chunk_size {
            return Err(format!(
                "overlapSize ({}) must be smaller than maxChunkSize ({})",
                self.overlap_size, self.max_chunk_size
            ));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(format!("temperature must be within [0, 2], got {}", self.temperature));
        }
        if self.max_tokens == 0 {
            return Err("maxTokens must be greater than 0".to_string());
        }
        if self.max_length == 0 {
            return Err("maxLength must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Entity types to request, falling back to the defaults when empty
    ///
    /// Lowercased and deduplicated, in first-seen order.
    pub fn effective_entity_types(&self) -> Vec<String> {
        let mut types: Vec<String> = Vec::with_capacity(self.entity_types.len());
        for t in &self.entity_types {
            let t = t.trim().to_lowercase();
            if !t.is_empty() && !types.contains(&t) {
                types.push(t);
            }
        }
        if types.is_empty() {
            DEFAULT_ENTITY_TYPES.iter().map(|s| s.to_string()).collect()
        } else {
            types
        }
    }
}
