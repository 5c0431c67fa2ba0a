//! Output formatting for the CLI.

use crate::config::OutputFormat;
use crate::error::Result;
use colored::*;
use lector_domain::AnalysisResult;
use serde_json::Value;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Format an analysis envelope.
    pub fn format_result(&self, result: &AnalysisResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string(result)?),
            OutputFormat::Pretty => Ok(serde_json::to_string_pretty(result)?),
            OutputFormat::Table => Ok(self.format_result_table(result)),
        }
    }

    /// Metadata table followed by either the data fields or the error.
    fn format_result_table(&self, result: &AnalysisResult) -> String {
        let meta = &result.meta;

        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        push_row(&mut builder, "Analysis", meta.analysis_id.clone());
        push_row(&mut builder, "Type", meta.analysis_type.to_string());
        if let Some(name) = &meta.document_name {
            push_row(&mut builder, "Document", name.clone());
        }
        push_row(&mut builder, "Length", format!("{} chars", meta.document_length));
        push_row(
            &mut builder,
            "Chunks",
            format!("{} ({} failed)", meta.chunk_count, meta.failed_chunks),
        );
        if let Some(mode) = meta.synthesis {
            push_row(&mut builder, "Synthesis", format!("{:?}", mode).to_lowercase());
        }
        push_row(&mut builder, "Completed", meta.timestamp.to_rfc3339());

        let mut out = self.table(builder);
        out.push('\n');

        match (&result.data, &result.error) {
            (Some(data), _) => {
                if data.is_empty() {
                    out.push_str(&self.warning("Analysis returned no fields"));
                } else {
                    let mut builder = Builder::default();
                    builder.push_record(["Key", "Value"]);
                    for (key, value) in data {
                        push_row(&mut builder, key, render_value(value));
                    }
                    out.push_str(&self.table(builder));
                }
            }
            (None, Some(error)) => out.push_str(&self.error(error)),
            (None, None) => out.push_str(&self.error("Analysis failed")),
        }

        out
    }

    fn table(&self, builder: Builder) -> String {
        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));
        table.to_string()
    }

    /// Format model availability.
    pub fn availability(&self, model: &str, base_url: &str, available: bool) -> String {
        if available {
            self.success(&format!("{} is available at {}", model, base_url))
        } else {
            self.warning(&format!("{} is not reachable at {}", model, base_url))
        }
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            _ => text.to_string(),
        }
    }
}

fn push_row(builder: &mut Builder, key: &str, value: String) {
    builder.push_record([key.to_string(), value]);
}

/// Render a JSON value for a table cell.
///
/// Strings are shown bare, arrays one item per line, everything else as JSON.
fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => format!("- {}", s),
                other => format!("- {}", other),
            })
            .collect::<Vec<_>>()
            .join("\n"),
        other => other.to_string(),
    }
}
