//! The result envelope returned by every analysis
//!
//! The envelope is the only contract the rest of an application may rely on.
//! Constructors keep `success`, `data` and `error` consistent: a successful
//! envelope always carries data and no error, a failed one always carries an
//! error and no data.

use crate::{AnalysisId, AnalysisType, StructuredData};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the final data of a successful analysis was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisMode {
    /// Exactly one chunk produced data, returned unchanged
    Single,
    /// A model call merged several chunk results
    Merged,
    /// The deterministic combiner merged several chunk results
    Fallback,
}

/// Metadata describing an analysis run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMeta {
    /// Identifier of the run
    pub analysis_id: String,
    /// Requested analysis type
    pub analysis_type: AnalysisType,
    /// Number of chunks the document was split into
    pub chunk_count: usize,
    /// Number of chunks whose analysis failed
    pub failed_chunks: usize,
    /// Document length in characters
    pub document_length: usize,
    /// Document name, when known
    pub document_name: Option<String>,
    /// How the data was produced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synthesis: Option<SynthesisMode>,
    /// Completion time (ISO-8601, UTC)
    pub timestamp: DateTime<Utc>,
}

impl AnalysisMeta {
    /// Fresh metadata for a run that has not produced chunks yet
    pub fn new(
        analysis_id: AnalysisId,
        analysis_type: AnalysisType,
        document_length: usize,
        document_name: Option<String>,
    ) -> Self {
        Self {
            analysis_id: analysis_id.to_string(),
            analysis_type,
            chunk_count: 0,
            failed_chunks: 0,
            document_length,
            document_name,
            synthesis: None,
            timestamp: Utc::now(),
        }
    }

    /// Stamp the completion time
    pub fn completed(mut self) -> Self {
        self.timestamp = Utc::now();
        self
    }
}

/// The `{success, data, error, meta}` envelope
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Whether structured data was produced
    pub success: bool,
    /// The structured data on success
    pub data: Option<StructuredData>,
    /// Human-readable error on failure
    pub error: Option<String>,
    /// Run metadata
    pub meta: AnalysisMeta,
}

impl AnalysisResult {
    /// Successful envelope
    pub fn success(data: StructuredData, meta: AnalysisMeta) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta,
        }
    }

    /// Failed envelope
    pub fn failure(error: impl Into<String>, meta: AnalysisMeta) -> Self {
        let mut error = error.into();
        if error.trim().is_empty() {
            error = "Analysis failed".to_string();
        }
        Self {
            success: false,
            data: None,
            error: Some(error),
            meta,
        }
    }

    /// Check `success ⟺ data present ⟺ error absent`
    pub fn is_consistent(&self) -> bool {
        self.success == self.data.is_some() && self.success == self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn meta() -> AnalysisMeta {
        AnalysisMeta::new(AnalysisId::new(), AnalysisType::Summary, 42, Some("doc.txt".into()))
    }

    #[test]
    fn test_success_envelope() {
        let mut data = StructuredData::new();
        data.insert("summary".into(), json!("short"));
        let result = AnalysisResult::success(data, meta());
        assert!(result.success);
        assert!(result.is_consistent());
    }

    #[test]
    fn test_failure_envelope_never_has_blank_error() {
        let result = AnalysisResult::failure("  ", meta());
        assert!(!result.success);
        assert!(result.is_consistent());
        assert_eq!(result.error.as_deref(), Some("Analysis failed"));
    }

    #[test]
    fn test_wire_shape() {
        let result = AnalysisResult::failure("boom", meta());
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["data"], json!(null));
        assert_eq!(value["error"], json!("boom"));
        assert_eq!(value["meta"]["analysisType"], json!("summary"));
        assert_eq!(value["meta"]["documentLength"], json!(42));
        assert_eq!(value["meta"]["documentName"], json!("doc.txt"));
        assert!(value["meta"].get("synthesis").is_none());

        // ISO-8601 timestamp
        let ts = value["meta"]["timestamp"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(ts).is_ok());
    }
}
