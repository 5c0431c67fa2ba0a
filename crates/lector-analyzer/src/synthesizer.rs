//! Merge chunk results into one document-level result
//!
//! One successful chunk is returned as-is. Several are merged by a single
//! model call; when that call fails or returns nothing usable, a
//! deterministic combiner folds the chunk objects together instead.

use crate::prompt::PromptBuilder;
use crate::repair::extract_and_parse;
use lector_domain::{
    AnalysisOptions, AnalysisType, ChunkResult, ModelClient, QueryOptions, StructuredData,
    SynthesisMode,
};
use serde_json::{Number, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Error message of the sentinel returned when no chunk produced data
pub const NO_VALID_RESULTS: &str = "No valid analysis results to synthesize";

/// Outcome of synthesis
#[derive(Debug, Clone, PartialEq)]
pub struct Synthesis {
    /// The merged data, or the no-valid-results sentinel
    pub data: StructuredData,
    /// How the data was produced; `None` for the sentinel
    pub mode: Option<SynthesisMode>,
}

impl Synthesis {
    fn sentinel() -> Self {
        let mut data = StructuredData::new();
        data.insert("error".to_string(), Value::String(NO_VALID_RESULTS.to_string()));
        Self { data, mode: None }
    }

    /// Whether this is the no-valid-results sentinel
    pub fn is_sentinel(&self) -> bool {
        self.mode.is_none()
    }
}

/// Merges ordered chunk results
pub struct Synthesizer<C> {
    client: Arc<C>,
    max_tokens_cap: u32,
}

impl<C> Synthesizer<C>
where
    C: ModelClient,
{
    /// Create a synthesizer capping the merge call at `max_tokens_cap` tokens
    pub fn new(client: Arc<C>, max_tokens_cap: u32) -> Self {
        Self {
            client,
            max_tokens_cap,
        }
    }

    /// Synthesize `results`, which must be in chunk index order
    ///
    /// Never fails: without usable chunks the sentinel is returned, and a
    /// failed merge call degrades to [`combine`].
    pub async fn synthesize(
        &self,
        results: &[ChunkResult],
        analysis_type: AnalysisType,
        options: &AnalysisOptions,
        document_preview: &str,
    ) -> Synthesis {
        let partials: Vec<&StructuredData> = results.iter().filter_map(ChunkResult::data).collect();

        match partials.as_slice() {
            [] => {
                warn!("No chunk produced usable data");
                Synthesis::sentinel()
            }
            [only] => Synthesis {
                data: (*only).clone(),
                mode: Some(SynthesisMode::Single),
            },
            _ => match self.merge(&partials, analysis_type, options, document_preview).await {
                Some(data) => {
                    info!(parts = partials.len(), "Merged chunk results with the model");
                    Synthesis {
                        data,
                        mode: Some(SynthesisMode::Merged),
                    }
                }
                None => {
                    warn!(parts = partials.len(), "Merge call unusable, combining chunk results locally");
                    Synthesis {
                        data: combine(&partials),
                        mode: Some(SynthesisMode::Fallback),
                    }
                }
            },
        }
    }

    async fn merge(
        &self,
        partials: &[&StructuredData],
        analysis_type: AnalysisType,
        options: &AnalysisOptions,
        document_preview: &str,
    ) -> Option<StructuredData> {
        let prompts = PromptBuilder::new(analysis_type, options);
        let system_prompt = prompts.synthesis_system_prompt(partials.len());
        let user_prompt = match prompts.synthesis_prompt(document_preview, partials) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!("Failed to build merge prompt: {}", e);
                return None;
            }
        };

        let query_options =
            QueryOptions::json(options.temperature, options.max_tokens.min(self.max_tokens_cap));

        debug!(prompt_chars = user_prompt.len(), "Querying model for merge");

        let response = match self
            .client
            .query(&system_prompt, &user_prompt, &query_options)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!("Merge call failed: {}", e);
                return None;
            }
        };

        extract_and_parse(&response)
            .map(|parsed| parsed.data)
            .filter(|data| !data.is_empty())
    }
}

/// Deterministically fold chunk objects together, in order
///
/// Same-named fields merge as: strings concatenated with a blank line
/// (identical strings kept once), arrays unioned in first-seen order,
/// numbers summed, objects merged recursively. Anything else keeps the
/// first value seen, except that `null` is replaced.
pub fn combine(partials: &[&StructuredData]) -> StructuredData {
    let mut merged = StructuredData::new();
    for partial in partials {
        merge_into(&mut merged, partial);
    }
    merged
}

fn merge_into(target: &mut StructuredData, source: &StructuredData) {
    for (key, incoming) in source {
        match target.get_mut(key) {
            Some(existing) => merge_value(existing, incoming),
            None => {
                target.insert(key.clone(), incoming.clone());
            }
        }
    }
}

fn merge_value(existing: &mut Value, incoming: &Value) {
    if existing.is_null() {
        *existing = incoming.clone();
        return;
    }

    match (existing, incoming) {
        (Value::String(a), Value::String(b)) => {
            if b.trim().is_empty() || a == b {
                return;
            }
            if a.trim().is_empty() {
                *a = b.clone();
            } else {
                a.push_str("\n\n");
                a.push_str(b);
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            for item in b {
                if !a.contains(item) {
                    a.push(item.clone());
                }
            }
        }
        (Value::Number(a), Value::Number(b)) => {
            if let Some(sum) = add_numbers(a, b) {
                *a = sum;
            }
        }
        (Value::Object(a), Value::Object(b)) => merge_into(a, b),
        _ => {}
    }
}

fn add_numbers(a: &Number, b: &Number) -> Option<Number> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if let Some(sum) = x.checked_add(y) {
            return Some(sum.into());
        }
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        if let Some(sum) = x.checked_add(y) {
            return Some(sum.into());
        }
    }
    Number::from_f64(a.as_f64()? + b.as_f64()?)
}
