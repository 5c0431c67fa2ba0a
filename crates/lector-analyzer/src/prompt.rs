//! Prompt construction for chunk analysis and synthesis

use crate::error::AnalyzerError;
use lector_domain::{AnalysisOptions, AnalysisType, Chunk, StructuredData};

/// Builds the system and user prompts for one analysis type
pub struct PromptBuilder<'a> {
    analysis_type: AnalysisType,
    options: &'a AnalysisOptions,
}

impl<'a> PromptBuilder<'a> {
    /// Create a new prompt builder
    pub fn new(analysis_type: AnalysisType, options: &'a AnalysisOptions) -> Self {
        Self {
            analysis_type,
            options,
        }
    }

    /// System prompt for analyzing one chunk
    pub fn system_prompt(&self) -> String {
        let mut prompt = String::new();

        // 1. Role and task
        prompt.push_str(ANALYST_ROLE);
        prompt.push_str("\n\n");
        prompt.push_str(&self.task_instructions());
        prompt.push_str("\n\n");

        // 2. Expected structure
        prompt.push_str("Respond with a JSON object of this shape:\n");
        prompt.push_str(&self.schema());
        prompt.push_str("\n\n");

        // 3. Output format directive
        prompt.push_str(OUTPUT_FORMAT_DIRECTIVE);

        prompt
    }

    /// User prompt carrying the chunk text
    pub fn chunk_prompt(&self, chunk: &Chunk, total: usize) -> String {
        let mut prompt = String::new();

        prompt.push_str(self.task_framing());
        if total > 1 {
            prompt.push_str(&format!(
                " This text is part {} of {} of a longer document; analyze only this part.",
                chunk.index + 1,
                total
            ));
        }
        prompt.push_str("\n\n");

        prompt.push_str("Text to analyze:\n");
        prompt.push_str("---\n");
        prompt.push_str(&chunk.text);
        prompt.push_str("\n---\n\n");

        prompt.push_str(OUTPUT_FORMAT_REMINDER);

        prompt
    }

    /// System prompt for merging `parts` partial analyses
    pub fn synthesis_system_prompt(&self, parts: usize) -> String {
        format!(
            "{}\n\nYou will receive {} partial {} analyses, each produced from a consecutive part of \
             the same document. Merge them into one analysis of the whole document.\n\n\
             Respond with a JSON object of this shape:\n{}\n\n{}",
            ANALYST_ROLE,
            parts,
            self.analysis_type,
            self.schema(),
            OUTPUT_FORMAT_DIRECTIVE
        )
    }

    /// User prompt carrying the document preview and the partial results
    pub fn synthesis_prompt(
        &self,
        preview: &str,
        partials: &[&StructuredData],
    ) -> Result<String, AnalyzerError> {
        let mut prompt = String::new();

        prompt.push_str("Beginning of the original document, for context:\n");
        prompt.push_str("---\n");
        prompt.push_str(preview);
        prompt.push_str("\n---\n\n");

        prompt.push_str("Partial analyses, in document order:\n");
        for (i, partial) in partials.iter().enumerate() {
            prompt.push_str(&format!("\n[Part {} of {}]\n", i + 1, partials.len()));
            prompt.push_str(&serde_json::to_string_pretty(partial)?);
            prompt.push('\n');
        }
        prompt.push('\n');

        prompt.push_str(MERGE_DIRECTIVES);
        prompt.push_str("\n\n");
        prompt.push_str(OUTPUT_FORMAT_REMINDER);

        Ok(prompt)
    }

    fn task_instructions(&self) -> String {
        match self.analysis_type {
            AnalysisType::General => GENERAL_INSTRUCTIONS.to_string(),
            AnalysisType::Entities => format!(
                "{}\nOnly extract entities of these types: {}.",
                ENTITY_INSTRUCTIONS,
                self.options.effective_entity_types().join(", ")
            ),
            AnalysisType::Summary => format!(
                "{}\nUse at most {} words. {}",
                SUMMARY_INSTRUCTIONS,
                self.options.max_length,
                self.options.format.instruction()
            ),
        }
    }

    fn task_framing(&self) -> &'static str {
        match self.analysis_type {
            AnalysisType::General => "Analyze the following text and extract its key insights.",
            AnalysisType::Entities => "Extract the named entities mentioned in the following text.",
            AnalysisType::Summary => "Summarize the following text.",
        }
    }

    fn schema(&self) -> String {
        match self.analysis_type {
            AnalysisType::General => GENERAL_SCHEMA.to_string(),
            AnalysisType::Entities => ENTITY_SCHEMA.replace(
                "ENTITY_TYPES",
                &self.options.effective_entity_types().join(" | "),
            ),
            AnalysisType::Summary => SUMMARY_SCHEMA.to_string(),
        }
    }
}

const ANALYST_ROLE: &str = "You are a careful document analyst. You read text and report what it says \
as structured JSON. You never invent facts that are not supported by the text.";

const GENERAL_INSTRUCTIONS: &str = r#"Identify what the text is about and what a reader should take away from it.
- "title": a short descriptive title
- "summary": two to four sentences
- "key_points": the most important statements, one idea each
- "topics": short topic labels
- "insights": non-obvious conclusions, implications or open questions
- "sentiment": overall tone (positive, negative, neutral or mixed)"#;

const ENTITY_INSTRUCTIONS: &str = r#"Identify every distinct named entity in the text.
- Merge different spellings of the same entity into one entry
- "mentions" counts how often the entity appears
- "context" is one short phrase from the text showing how the entity is used"#;

const SUMMARY_INSTRUCTIONS: &str = r#"Write a faithful summary of the text.
- Keep the author's emphasis and conclusions
- Do not add opinions or outside knowledge
- "key_points" lists the main points the summary covers"#;

const GENERAL_SCHEMA: &str = r#"{
  "title": "string",
  "summary": "string",
  "key_points": ["string"],
  "topics": ["string"],
  "insights": ["string"],
  "sentiment": "positive | negative | neutral | mixed"
}"#;

const ENTITY_SCHEMA: &str = r#"{
  "entities": [
    {
      "name": "string",
      "type": "ENTITY_TYPES",
      "mentions": 1,
      "context": "string"
    }
  ]
}"#;

const SUMMARY_SCHEMA: &str = r#"{
  "summary": "string",
  "key_points": ["string"]
}"#;

const MERGE_DIRECTIVES: &str = r#"Merge the partial analyses:
- Deduplicate repeated items and entities (keep the most complete version)
- Resolve contradictions in favour of the better supported statement
- Preserve every key insight that appears in any part
- Produce ONE coherent result with exactly the same structure as each part"#;

const OUTPUT_FORMAT_DIRECTIVE: &str = "Output rules: respond with a single valid JSON object. \
Use double quotes for all keys and strings. No markdown code blocks, no comments, no text before or after the JSON.";

const OUTPUT_FORMAT_REMINDER: &str = "Remember: Return ONLY valid JSON, no markdown code blocks, no explanations.";
