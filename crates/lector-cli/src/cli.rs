//! CLI command definitions and argument parsing.

use clap::{Parser, Subcommand};
use lector_domain::{AnalysisOptions, AnalysisType, SummaryFormat};
use std::path::PathBuf;

/// Lector CLI - Analyze documents with a language model.
#[derive(Debug, Parser)]
#[command(name = "lector")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Profile to use
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// Log pipeline progress to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// API key for OpenAI-compatible backends
    #[arg(long, global = true, env = "LECTOR_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table of metadata and top-level fields
    Table,
    /// Compact JSON envelope
    Json,
    /// Indented JSON envelope
    Pretty,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Analyze a document
    Analyze(AnalyzeArgs),

    /// Check whether the active profile's model is reachable
    Status,

    /// Show or initialize the configuration file
    Config(ConfigArgs),
}

/// Arguments for the analyze command.
#[derive(Debug, Parser)]
pub struct AnalyzeArgs {
    /// Text file to analyze
    pub file: PathBuf,

    /// Analysis type
    #[arg(short = 't', long = "type", value_enum)]
    pub analysis_type: Option<AnalysisTypeArg>,

    /// Maximum chunk size in characters
    #[arg(long)]
    pub max_chunk_size: Option<usize>,

    /// Overlap between chunks in characters
    #[arg(long)]
    pub overlap: Option<usize>,

    /// Sampling temperature (0.0-2.0)
    #[arg(long)]
    pub temperature: Option<f32>,

    /// Token budget for the analysis
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// Entity types to extract, comma separated
    #[arg(long, value_delimiter = ',')]
    pub entity_types: Vec<String>,

    /// Maximum summary length in words
    #[arg(long)]
    pub max_length: Option<usize>,

    /// Summary format
    #[arg(long, value_enum)]
    pub summary_format: Option<SummaryFormatArg>,

    /// Also save the envelope as pretty JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl AnalyzeArgs {
    /// Overlay the flags given on the command line onto `base`.
    pub fn options(&self, base: &AnalysisOptions) -> AnalysisOptions {
        let mut options = base.clone();
        if let Some(size) = self.max_chunk_size {
            options.max_chunk_size = size;
        }
        if let Some(overlap) = self.overlap {
            options.overlap_size = overlap;
        }
        if let Some(temperature) = self.temperature {
            options.temperature = temperature;
        }
        if let Some(max_tokens) = self.max_tokens {
            options.max_tokens = max_tokens;
        }
        if !self.entity_types.is_empty() {
            options.entity_types = self.entity_types.clone();
        }
        if let Some(max_length) = self.max_length {
            options.max_length = max_length;
        }
        if let Some(format) = self.summary_format {
            options.format = format.into();
        }
        options
    }
}

/// Arguments for the config command.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration as TOML
    Show,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

/// Analysis type argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum AnalysisTypeArg {
    /// Key insights, topics and sentiment
    General,
    /// Named entities
    Entities,
    /// Constrained summary
    Summary,
}

/// Summary format argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum SummaryFormatArg {
    /// Flowing prose
    Paragraph,
    /// Bullet list
    Bullets,
    /// Hierarchical outline
    Outline,
}

impl From<CliFormat> for crate::config::OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => crate::config::OutputFormat::Table,
            CliFormat::Json => crate::config::OutputFormat::Json,
            CliFormat::Pretty => crate::config::OutputFormat::Pretty,
        }
    }
}

impl From<AnalysisTypeArg> for AnalysisType {
    fn from(arg: AnalysisTypeArg) -> Self {
        match arg {
            AnalysisTypeArg::General => AnalysisType::General,
            AnalysisTypeArg::Entities => AnalysisType::Entities,
            AnalysisTypeArg::Summary => AnalysisType::Summary,
        }
    }
}

impl From<SummaryFormatArg> for SummaryFormat {
    fn from(arg: SummaryFormatArg) -> Self {
        match arg {
            SummaryFormatArg::Paragraph => SummaryFormat::Paragraph,
            SummaryFormatArg::Bullets => SummaryFormat::Bullets,
            SummaryFormatArg::Outline => SummaryFormat::Outline,
        }
    }
}
