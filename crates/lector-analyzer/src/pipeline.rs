//! Document analysis pipeline
//!
//! `analyze_document` is the single entry point: it screens and cleans the
//! text, chunks it, analyzes the chunks concurrently, and synthesizes the
//! ordered results. Every outcome, including panics inside the pipeline,
//! comes back as an [`AnalysisResult`] envelope.

use crate::chunk_analyzer::ChunkAnalyzer;
use crate::chunking::TextChunker;
use crate::config::AnalyzerConfig;
use crate::error::AnalyzerError;
use crate::sanitize::{clean_text, detect_binary};
use crate::synthesizer::{Synthesizer, NO_VALID_RESULTS};
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use lector_domain::{
    AnalysisId, AnalysisMeta, AnalysisOptions, AnalysisResult, AnalysisType, Chunk, ChunkOutcome,
    ChunkResult, DocumentText, ModelClient, StructuredData, SynthesisMode,
};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Runs the analysis pipeline against a model client
pub struct Analyzer<C>
where
    C: ModelClient,
{
    client: Arc<C>,
    config: AnalyzerConfig,
}

impl<C> Analyzer<C>
where
    C: ModelClient + 'static,
{
    /// Create a new Analyzer
    pub fn new(client: C, config: AnalyzerConfig) -> Self {
        Self::from_arc(Arc::new(client), config)
    }

    /// Create an Analyzer around a client shared with other owners
    pub fn from_arc(client: Arc<C>, config: AnalyzerConfig) -> Self {
        Self { client, config }
    }

    /// The configuration in use
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// The model client in use
    pub fn client(&self) -> &Arc<C> {
        &self.client
    }

    /// Analyze a document
    ///
    /// The explicit `analysis_type` wins over the one carried in `options`;
    /// without either, a general analysis is run. `None` options fall back
    /// to `config.defaults`.
    pub async fn analyze_document<D>(
        &self,
        document: &D,
        analysis_type: Option<AnalysisType>,
        options: Option<&AnalysisOptions>,
    ) -> AnalysisResult
    where
        D: DocumentText + ?Sized,
    {
        let analysis_id = AnalysisId::new();
        let options = options.unwrap_or(&self.config.defaults);
        let analysis_type = analysis_type.or(options.analysis_type).unwrap_or_default();
        let text = document.plain_text();

        let mut meta = AnalysisMeta::new(
            analysis_id,
            analysis_type,
            text.chars().count(),
            document.name().map(str::to_string),
        );

        let span = info_span!(
            "analyze_document",
            analysis_id = %analysis_id,
            analysis_type = %analysis_type
        );

        let outcome = AssertUnwindSafe(self.run(&text, analysis_type, options, &mut meta))
            .catch_unwind()
            .instrument(span)
            .await;

        let meta = meta.completed();
        match outcome {
            Ok(Ok(data)) => AnalysisResult::success(data, meta),
            Ok(Err(e)) => {
                warn!(analysis_id = %analysis_id, "Analysis failed: {}", e);
                AnalysisResult::failure(e.to_string(), meta)
            }
            Err(payload) => {
                let message = panic_message(&*payload);
                error!(analysis_id = %analysis_id, "Analysis panicked: {}", message);
                AnalysisResult::failure(format!("Internal error during analysis: {}", message), meta)
            }
        }
    }

    async fn run(
        &self,
        text: &str,
        analysis_type: AnalysisType,
        options: &AnalysisOptions,
        meta: &mut AnalysisMeta,
    ) -> Result<StructuredData, AnalyzerError> {
        self.config.validate().map_err(AnalyzerError::Config)?;
        options.validate().map_err(AnalyzerError::InvalidInput)?;

        if meta.document_length > self.config.max_text_length {
            return Err(AnalyzerError::TextTooLong(
                meta.document_length,
                self.config.max_text_length,
            ));
        }

        if let Some(reason) = detect_binary(text, self.config.binary_threshold) {
            return Err(AnalyzerError::BinaryContent(reason));
        }

        let cleaned = clean_text(text);
        if cleaned.is_empty() {
            return Err(AnalyzerError::EmptyDocument);
        }

        let chunks = TextChunker::new(options.max_chunk_size, options.overlap_size).split(&cleaned);
        meta.chunk_count = chunks.len();

        info!(
            document_chars = meta.document_length,
            cleaned_chars = cleaned.chars().count(),
            chunks = chunks.len(),
            "Document accepted"
        );

        let mut results = self.analyze_chunks(&chunks, analysis_type, options).await;
        meta.failed_chunks = results.iter().filter(|r| !r.is_ok()).count();

        if results.len() == 1 {
            return match results.remove(0).outcome {
                ChunkOutcome::Ok { data, .. } => {
                    meta.synthesis = Some(SynthesisMode::Single);
                    Ok(data)
                }
                ChunkOutcome::Failed { error, .. } => Err(AnalyzerError::NoUsableResults(error)),
            };
        }

        let preview: String = cleaned.chars().take(self.config.preview_chars).collect();
        let synthesizer = Synthesizer::new(Arc::clone(&self.client), self.config.synthesis_max_tokens);
        let synthesis = synthesizer
            .synthesize(&results, analysis_type, options, &preview)
            .await;

        if synthesis.is_sentinel() {
            return Err(AnalyzerError::NoUsableResults(NO_VALID_RESULTS.to_string()));
        }

        info!(
            failed_chunks = meta.failed_chunks,
            synthesis = ?synthesis.mode,
            "Analysis complete"
        );
        meta.synthesis = synthesis.mode;
        Ok(synthesis.data)
    }

    /// Analyze every chunk, returning results in chunk order
    async fn analyze_chunks(
        &self,
        chunks: &[Chunk],
        analysis_type: AnalysisType,
        options: &AnalysisOptions,
    ) -> Vec<ChunkResult> {
        let total = chunks.len();
        let concurrency = if self.client.is_concurrency_safe() {
            self.config.concurrency_for(total)
        } else {
            1
        };
        debug!(total, concurrency, "Fanning out chunk analyses");

        let analyzer = ChunkAnalyzer::new(Arc::clone(&self.client), self.config.chunk_max_tokens);
        let analyzer = &analyzer;

        let mut results: Vec<ChunkResult> = stream::iter(chunks)
            .map(|chunk| async move {
                match analyzer.analyze_chunk(chunk, total, analysis_type, options).await {
                    Ok(result) => result,
                    Err(e) => {
                        warn!(chunk = chunk.index + 1, "Chunk analysis failed: {}", e);
                        ChunkResult::failed(chunk.index, e.to_string(), "")
                    }
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        results.sort_by_key(|r| r.index);
        results
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
