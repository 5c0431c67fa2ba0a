//! Per-chunk analysis: prompt, model call, extraction and repair

use crate::error::AnalyzerError;
use crate::prompt::PromptBuilder;
use crate::repair::extract_and_parse;
use lector_domain::{AnalysisOptions, AnalysisType, Chunk, ChunkResult, ModelClient, QueryOptions};
use std::sync::Arc;
use tracing::{debug, warn};

/// Reason recorded when the model returns nothing
pub const EMPTY_RESPONSE: &str = "Empty response from LLM";

/// Reason recorded when no JSON object could be recovered
pub const PARSE_FAILED: &str = "JSON parsing failed";

/// Analyzes single chunks against a model client
pub struct ChunkAnalyzer<C> {
    client: Arc<C>,
    max_tokens_cap: u32,
}

impl<C> ChunkAnalyzer<C>
where
    C: ModelClient,
{
    /// Create a chunk analyzer capping each call at `max_tokens_cap` tokens
    pub fn new(client: Arc<C>, max_tokens_cap: u32) -> Self {
        Self {
            client,
            max_tokens_cap,
        }
    }

    /// Analyze one chunk of a document split into `total` chunks
    ///
    /// Model-content problems come back as a failed [`ChunkResult`]; only
    /// transport faults are returned as errors.
    pub async fn analyze_chunk(
        &self,
        chunk: &Chunk,
        total: usize,
        analysis_type: AnalysisType,
        options: &AnalysisOptions,
    ) -> Result<ChunkResult, AnalyzerError> {
        let prompts = PromptBuilder::new(analysis_type, options);
        let system_prompt = prompts.system_prompt();
        let user_prompt = prompts.chunk_prompt(chunk, total);

        let query_options =
            QueryOptions::json(options.temperature, options.max_tokens.min(self.max_tokens_cap));

        debug!(
            chunk = chunk.index + 1,
            total,
            prompt_chars = user_prompt.len(),
            "Querying model for chunk"
        );

        let response = self
            .client
            .query(&system_prompt, &user_prompt, &query_options)
            .await
            .map_err(|e| AnalyzerError::Llm(e.to_string()))?;

        debug!(chunk = chunk.index + 1, response_chars = response.len(), "Model responded");

        Ok(interpret_response(chunk.index, &response))
    }
}

/// Turn raw model text into a chunk result
pub fn interpret_response(index: usize, response: &str) -> ChunkResult {
    if response.trim().is_empty() {
        warn!(chunk = index + 1, "Model returned an empty response");
        return ChunkResult::failed(index, EMPTY_RESPONSE, "");
    }

    match extract_and_parse(response) {
        Some(parsed) => {
            if parsed.repaired {
                warn!(chunk = index + 1, "Model output needed JSON repair");
            }
            ChunkResult::ok(index, parsed.data, parsed.repaired)
        }
        None => {
            warn!(chunk = index + 1, "Could not recover JSON from model output");
            ChunkResult::failed(index, PARSE_FAILED, response)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lector_domain::ChunkOutcome;
    use lector_llm::MockClient;
    use serde_json::json;

    fn chunk(index: usize, text: &str) -> Chunk {
        Chunk {
            index,
            start: 0,
            end: text.chars().count(),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_prose_wrapped_json() {
        let result = interpret_response(0, r#"Sure! Here is the JSON: {"title":"X"} Hope that helps!"#);
        match result.outcome {
            ChunkOutcome::Ok { data, repaired } => {
                assert_eq!(data.get("title"), Some(&json!("X")));
                assert!(!repaired);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_empty_response() {
        assert_eq!(interpret_response(3, ""), ChunkResult::failed(3, EMPTY_RESPONSE, ""));
        assert_eq!(interpret_response(3, "  \n "), ChunkResult::failed(3, EMPTY_RESPONSE, ""));
    }

    #[test]
    fn test_unparseable_response_keeps_raw_text() {
        let result = interpret_response(1, "I cannot help with that.");
        assert_eq!(result, ChunkResult::failed(1, PARSE_FAILED, "I cannot help with that."));
    }

    #[test]
    fn test_repaired_response_is_tagged() {
        let result = interpret_response(0, "{'title': 'X',}");
        assert!(matches!(result.outcome, ChunkOutcome::Ok { repaired: true, .. }));
    }

    #[tokio::test]
    async fn test_analyze_chunk_caps_tokens_and_requests_json() {
        let client = Arc::new(MockClient::new(r#"{"summary": "ok"}"#));
        let analyzer = ChunkAnalyzer::new(Arc::clone(&client), 2000);
        let options = AnalysisOptions {
            max_tokens: 8000,
            temperature: 0.7,
            ..Default::default()
        };

        let result = analyzer
            .analyze_chunk(&chunk(0, "text"), 1, AnalysisType::Summary, &options)
            .await
            .unwrap();
        assert!(result.is_ok());

        let calls = client.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].options, QueryOptions::json(0.7, 2000));
        assert!(calls[0].user_prompt.contains("Summarize"));
    }

    #[tokio::test]
    async fn test_analyze_chunk_keeps_smaller_budget() {
        let client = Arc::new(MockClient::new("{}"));
        let analyzer = ChunkAnalyzer::new(Arc::clone(&client), 2000);
        let options = AnalysisOptions {
            max_tokens: 500,
            ..Default::default()
        };
        analyzer
            .analyze_chunk(&chunk(0, "text"), 1, AnalysisType::General, &options)
            .await
            .unwrap();
        assert_eq!(client.calls()[0].options.max_tokens, Some(500));
    }

    #[tokio::test]
    async fn test_transport_fault_is_an_error() {
        let client = Arc::new(MockClient::default());
        client.fail_when("doomed");
        let analyzer = ChunkAnalyzer::new(client, 2000);

        let result = analyzer
            .analyze_chunk(&chunk(0, "doomed"), 1, AnalysisType::General, &AnalysisOptions::default())
            .await;
        assert!(matches!(result, Err(AnalyzerError::Llm(_))));
    }
}
