//! Analyze command implementation.

use crate::cli::AnalyzeArgs;
use crate::client::ProfileClient;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use lector_analyzer::{Analyzer, AnalyzerConfig};
use lector_domain::{AnalysisResult, Document, ModelClient};
use std::fs;
use std::path::Path;
use tracing::info;

/// Execute the analyze command.
///
/// Returns whether the analysis succeeded.
pub async fn execute_analyze(
    args: AnalyzeArgs,
    config: &Config,
    api_key: Option<&str>,
    formatter: &Formatter,
) -> Result<bool> {
    let profile = config.get_active_profile()?;
    let client = ProfileClient::from_profile(profile, api_key)?;
    info!(model = client.model(), base_url = %profile.base_url, "Using model");

    run_analysis(&args, &config.analyzer, client, formatter).await
}

/// Analyze the file named by `args` with `client` and print the envelope.
pub async fn run_analysis<C>(
    args: &AnalyzeArgs,
    analyzer_config: &AnalyzerConfig,
    client: C,
    formatter: &Formatter,
) -> Result<bool>
where
    C: ModelClient + 'static,
{
    let document = read_document(&args.file)?;
    let options = args.options(&analyzer_config.defaults);
    let analysis_type = args.analysis_type.map(Into::into);

    let analyzer = Analyzer::new(client, analyzer_config.clone());
    let result = analyzer
        .analyze_document(&document, analysis_type, Some(&options))
        .await;

    println!("{}", formatter.format_result(&result)?);

    if let Some(path) = &args.output {
        save_result(&result, path)?;
        eprintln!("{}", formatter.info(&format!("Saved to {}", path.display())));
    }

    Ok(result.success)
}

/// Read a file as text, replacing invalid UTF-8.
fn read_document(path: &Path) -> Result<Document> {
    let bytes = fs::read(path)?;
    let text = String::from_utf8_lossy(&bytes).into_owned();
    let document = match path.file_name() {
        Some(name) => Document::new(text).with_name(name.to_string_lossy()),
        None => Document::new(text),
    };
    Ok(document)
}

fn save_result(result: &AnalysisResult, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string_pretty(result)?)?;
    Ok(())
}
