//! Integration tests for the analysis pipeline

#[cfg(test)]
mod tests {
    use crate::{Analyzer, AnalyzerConfig, NO_VALID_RESULTS};
    use async_trait::async_trait;
    use lector_domain::{
        AnalysisOptions, AnalysisResult, AnalysisType, Document, ModelClient, QueryOptions,
        SynthesisMode,
    };
    use lector_llm::{LlmError, MockClient};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    const MERGE_MARKER: &str = "Merge the partial analyses";

    /// 9000 characters of plain prose
    fn long_prose() -> String {
        "The quick brown fox jumps over the lazy dog. ".repeat(200)
    }

    fn analyzer_for(client: &Arc<MockClient>) -> Analyzer<MockClient> {
        Analyzer::from_arc(Arc::clone(client), AnalyzerConfig::default())
    }

    fn merge_calls(client: &MockClient) -> usize {
        client
            .calls()
            .iter()
            .filter(|call| call.user_prompt.contains(MERGE_MARKER))
            .count()
    }

    #[tokio::test]
    async fn test_short_document_single_call() {
        let client = Arc::new(MockClient::new(r#"{"title": "Short", "topics": ["notes"]}"#));
        let analyzer = analyzer_for(&client);

        let result = analyzer.analyze_document("short doc", None, None).await;

        assert!(result.success, "error: {:?}", result.error);
        assert_eq!(client.call_count(), 1);
        assert_eq!(merge_calls(&client), 0);
        assert_eq!(
            result.data.as_ref().unwrap().get("title"),
            Some(&json!("Short"))
        );
        assert_eq!(result.meta.chunk_count, 1);
        assert_eq!(result.meta.document_length, 9);
        assert_eq!(result.meta.synthesis, Some(SynthesisMode::Single));

        let call = &client.calls()[0];
        assert!(call.user_prompt.contains("short doc"));
        assert!(call.options.wants_json());
    }

    #[tokio::test]
    async fn test_long_document_merges_three_chunks() {
        let client = Arc::new(MockClient::default());
        client.respond_when(MERGE_MARKER, r#"{"summary": "whole document"}"#);
        client.respond_when("part 1 of 3", r#"{"summary": "first"}"#);
        client.respond_when("part 2 of 3", r#"{"summary": "second"}"#);
        client.respond_when("part 3 of 3", r#"{"summary": "third"}"#);
        let analyzer = analyzer_for(&client);

        let options = AnalysisOptions {
            max_chunk_size: 4000,
            overlap_size: 200,
            ..Default::default()
        };
        let result = analyzer
            .analyze_document(&long_prose(), Some(AnalysisType::Summary), Some(&options))
            .await;

        assert!(result.success, "error: {:?}", result.error);
        assert_eq!(result.meta.chunk_count, 3);
        assert_eq!(result.meta.failed_chunks, 0);
        assert_eq!(result.meta.synthesis, Some(SynthesisMode::Merged));
        assert_eq!(client.call_count(), 4);
        assert_eq!(merge_calls(&client), 1);
        assert_eq!(
            result.data.unwrap().get("summary"),
            Some(&json!("whole document"))
        );

        let merge = client
            .calls()
            .into_iter()
            .find(|call| call.user_prompt.contains(MERGE_MARKER))
            .unwrap();
        let first = merge.user_prompt.find("\"first\"").unwrap();
        let second = merge.user_prompt.find("\"second\"").unwrap();
        let third = merge.user_prompt.find("\"third\"").unwrap();
        assert!(first < second && second < third);
        assert!(merge.system_prompt.contains("3 partial summary analyses"));
    }

    #[tokio::test]
    async fn test_prose_wrapped_json_from_model() {
        let client = Arc::new(MockClient::new(
            r#"Sure! Here is the JSON: {"title":"X"} Hope that helps!"#,
        ));
        let analyzer = analyzer_for(&client);

        let result = analyzer.analyze_document("short doc", None, None).await;
        assert!(result.success);
        assert_eq!(result.data.unwrap(), json!({"title": "X"}).as_object().unwrap().clone());
    }

    #[tokio::test]
    async fn test_empty_chunk_response_does_not_block_siblings() {
        let client = Arc::new(MockClient::default());
        client.respond_when(MERGE_MARKER, r#"{"summary": "merged"}"#);
        client.respond_when("part 2 of 3", "");
        client.respond_when("part 1 of 3", r#"{"summary": "first"}"#);
        client.respond_when("part 3 of 3", r#"{"summary": "third"}"#);
        let analyzer = analyzer_for(&client);

        let result = analyzer.analyze_document(&long_prose(), None, None).await;

        assert!(result.success);
        assert_eq!(result.meta.failed_chunks, 1);
        assert_eq!(merge_calls(&client), 1);

        let merge = client
            .calls()
            .into_iter()
            .find(|call| call.user_prompt.contains(MERGE_MARKER))
            .unwrap();
        assert!(merge.user_prompt.contains("[Part 2 of 2]"));
        assert!(!merge.user_prompt.contains("[Part 3 of"));
        assert!(merge.user_prompt.contains("\"third\""));
    }

    #[tokio::test]
    async fn test_all_chunks_failed() {
        let client = Arc::new(MockClient::new("I'm sorry, I can't do that."));
        let analyzer = analyzer_for(&client);

        let result = analyzer.analyze_document(&long_prose(), None, None).await;

        assert!(!result.success);
        assert_eq!(result.error.as_deref(), Some(NO_VALID_RESULTS));
        assert!(result.data.is_none());
        assert_eq!(result.meta.chunk_count, 3);
        assert_eq!(result.meta.failed_chunks, 3);
        assert_eq!(result.meta.synthesis, None);
        assert_eq!(merge_calls(&client), 0);
    }

    #[tokio::test]
    async fn test_transport_fault_in_one_chunk_degrades() {
        let client = Arc::new(MockClient::default());
        client.respond_when(MERGE_MARKER, r#"{"summary": "merged"}"#);
        client.fail_when("part 2 of 3");
        client.respond_when("part 1 of 3", r#"{"summary": "first"}"#);
        client.respond_when("part 3 of 3", r#"{"summary": "third"}"#);
        let analyzer = analyzer_for(&client);

        let result = analyzer.analyze_document(&long_prose(), None, None).await;

        assert!(result.success);
        assert_eq!(result.meta.failed_chunks, 1);
        assert_eq!(result.meta.synthesis, Some(SynthesisMode::Merged));
    }

    #[tokio::test]
    async fn test_transport_fault_on_single_chunk_fails() {
        let client = Arc::new(MockClient::default());
        client.fail_when("short doc");
        let analyzer = analyzer_for(&client);

        let result = analyzer.analyze_document("short doc", None, None).await;

        assert!(!result.success);
        let error = result.error.unwrap();
        assert!(error.starts_with("LLM request failed"), "error: {}", error);
    }

    #[tokio::test]
    async fn test_merge_failure_uses_fallback_combiner() {
        let client = Arc::new(MockClient::default());
        client.fail_when(MERGE_MARKER);
        client.respond_when("part 1 of 3", r#"{"summary": "first", "key_points": ["a"]}"#);
        client.respond_when("part 2 of 3", r#"{"summary": "second", "key_points": ["a", "b"]}"#);
        client.respond_when("part 3 of 3", r#"{"summary": "third", "key_points": ["c"]}"#);
        let analyzer = analyzer_for(&client);

        let result = analyzer
            .analyze_document(&long_prose(), Some(AnalysisType::Summary), None)
            .await;

        assert!(result.success);
        assert_eq!(result.meta.synthesis, Some(SynthesisMode::Fallback));
        assert_eq!(
            serde_json::Value::Object(result.data.unwrap()),
            json!({
                "summary": "first\n\nsecond\n\nthird",
                "key_points": ["a", "b", "c"]
            })
        );
    }

    #[tokio::test]
    async fn test_results_are_ordered_despite_completion_order() {
        let client = Arc::new(MockClient::default());
        client.fail_when(MERGE_MARKER);
        client.respond_after("part 1 of 3", r#"{"order": ["first"]}"#, Duration::from_millis(60));
        client.respond_after("part 2 of 3", r#"{"order": ["second"]}"#, Duration::from_millis(30));
        client.respond_when("part 3 of 3", r#"{"order": ["third"]}"#);
        let analyzer = analyzer_for(&client);

        let result = analyzer.analyze_document(&long_prose(), None, None).await;

        assert!(result.success);
        assert_eq!(
            result.data.unwrap().get("order"),
            Some(&json!(["first", "second", "third"]))
        );
        assert!(client.peak_in_flight() > 1);
    }

    #[tokio::test]
    async fn test_client_that_is_not_concurrency_safe_is_serialized() {
        let client = Arc::new(MockClient::new(r#"{"ok": true}"#).with_concurrency_safe(false));
        client.respond_after("part 1 of 3", r#"{"ok": true}"#, Duration::from_millis(20));
        client.respond_after("part 2 of 3", r#"{"ok": true}"#, Duration::from_millis(20));
        let analyzer = analyzer_for(&client);

        let result = analyzer.analyze_document(&long_prose(), None, None).await;

        assert!(result.success);
        assert_eq!(client.peak_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_concurrency_limit_from_config() {
        let client = Arc::new(MockClient::new(r#"{"ok": true}"#));
        client.respond_after("part", r#"{"ok": true}"#, Duration::from_millis(20));
        let config = AnalyzerConfig {
            max_concurrent_chunks: 2,
            ..Default::default()
        };
        let analyzer = Analyzer::from_arc(Arc::clone(&client), config);

        let result = analyzer.analyze_document(&long_prose(), None, None).await;

        assert!(result.success);
        assert_eq!(client.peak_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_binary_content_is_rejected() {
        let client = Arc::new(MockClient::new("{}"));
        let analyzer = analyzer_for(&client);

        let result = analyzer
            .analyze_document("%PDF-1.7\n%\u{FFFD}\u{FFFD}\n1 0 obj", None, None)
            .await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("binary"));
        assert_eq!(result.meta.chunk_count, 0);
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_encoded_noise_is_cleaned_before_analysis() {
        let client = Arc::new(MockClient::new(r#"{"title": "Cleaned"}"#));
        let analyzer = analyzer_for(&client);
        let text = format!("Intro paragraph.\n\n{}\n\nOutro.", "QUJD".repeat(100));

        let result = analyzer.analyze_document(&text, None, None).await;

        assert!(result.success);
        let prompt = &client.calls()[0].user_prompt;
        assert!(prompt.contains("[encoded content removed]"));
        assert!(!prompt.contains("QUJDQUJD"));
        assert_eq!(result.meta.document_length, text.chars().count());
    }

    #[tokio::test]
    async fn test_json_document_source() {
        let client = Arc::new(MockClient::new(r#"{"title": "Notes"}"#));
        let analyzer = analyzer_for(&client);
        let document = Document::from_json(&json!({
            "name": "notes.txt",
            "content": "Meeting notes from Tuesday."
        }));

        let result = analyzer.analyze_document(&document, None, None).await;

        assert!(result.success);
        assert_eq!(result.meta.document_name.as_deref(), Some("notes.txt"));
        assert!(client.calls()[0].user_prompt.contains("Meeting notes from Tuesday."));
    }

    #[tokio::test]
    async fn test_entity_options_reach_prompt() {
        let client = Arc::new(MockClient::new(r#"{"entities": []}"#));
        let analyzer = analyzer_for(&client);
        let options = AnalysisOptions {
            entity_types: vec!["Person".into(), " product ".into()],
            ..Default::default()
        };

        let result = analyzer
            .analyze_document("Alice bought a Widget.", Some(AnalysisType::Entities), Some(&options))
            .await;

        assert!(result.success);
        assert!(client.calls()[0].system_prompt.contains("person, product"));
    }

    struct PanickingClient;

    #[async_trait]
    impl ModelClient for PanickingClient {
        type Error = LlmError;

        async fn query(
            &self,
            _system_prompt: &str,
            _user_prompt: &str,
            _options: &QueryOptions,
        ) -> Result<String, Self::Error> {
            panic!("backend exploded");
        }

        async fn check_availability(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_panic_becomes_failed_envelope() {
        let analyzer = Analyzer::new(PanickingClient, AnalyzerConfig::default());

        let result = analyzer.analyze_document("short doc", None, None).await;

        assert!(!result.success);
        assert!(result.error.unwrap().contains("backend exploded"));
        assert!(result.data.is_none());
    }

    #[tokio::test]
    async fn test_envelope_contract_holds_for_every_outcome() {
        let outcomes: Vec<AnalysisResult> = {
            let ok = Analyzer::new(MockClient::new(r#"{"a": 1}"#), AnalyzerConfig::default());
            let empty = Analyzer::new(MockClient::new(""), AnalyzerConfig::default());
            let garbage = Analyzer::new(MockClient::new("nope"), AnalyzerConfig::default());
            vec![
                ok.analyze_document("short doc", None, None).await,
                ok.analyze_document(&long_prose(), None, None).await,
                ok.analyze_document("", None, None).await,
                ok.analyze_document("\0\0\0", None, None).await,
                empty.analyze_document("short doc", None, None).await,
                garbage.analyze_document(&long_prose(), None, None).await,
                Analyzer::new(PanickingClient, AnalyzerConfig::default())
                    .analyze_document("short doc", None, None)
                    .await,
            ]
        };

        for result in &outcomes {
            assert!(result.is_consistent(), "inconsistent envelope: {:?}", result);
            if let Some(error) = &result.error {
                assert!(!error.trim().is_empty());
            }
        }
    }

    #[tokio::test]
    async fn test_envelope_wire_shape() {
        let analyzer = Analyzer::new(MockClient::new(r#"{"title": "T"}"#), AnalyzerConfig::default());
        let result = analyzer
            .analyze_document(&Document::new("short doc").with_name("a.txt"), None, None)
            .await;

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["error"], json!(null));
        assert_eq!(value["data"]["title"], json!("T"));
        assert_eq!(value["meta"]["analysisType"], json!("general"));
        assert_eq!(value["meta"]["chunkCount"], json!(1));
        assert_eq!(value["meta"]["documentName"], json!("a.txt"));
        assert_eq!(value["meta"]["synthesis"], json!("single"));
        assert!(value["meta"]["analysisId"].as_str().unwrap().len() == 36);
        assert!(value["meta"]["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_pipeline_holds_no_state_between_runs() {
        let client = Arc::new(MockClient::new(r#"{"a": 1}"#));
        let analyzer = analyzer_for(&client);

        let first = analyzer.analyze_document("one", None, None).await;
        let second = analyzer.analyze_document("one", None, None).await;

        assert_eq!(first.data, second.data);
        assert_ne!(first.meta.analysis_id, second.meta.analysis_id);
    }
}
