//! Lector CLI - Analyze documents with a language model.

use anyhow::Context;
use clap::Parser;
use lector_cli::commands;
use lector_cli::{Cli, Command, Config, Formatter};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    match run().await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Run the CLI; `Ok(false)` means the command completed but did not succeed.
async fn run() -> anyhow::Result<bool> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let path = match cli.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let mut config = Config::load_from(&path)
        .with_context(|| format!("Failed to load config from {}", path.display()))?;

    if let Some(profile_name) = cli.profile {
        config.switch_profile(profile_name)?;
    }

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);
    let api_key = cli.api_key.as_deref();

    let ok = match cli.command {
        Command::Analyze(args) => {
            let file = args.file.display().to_string();
            commands::execute_analyze(args, &config, api_key, &formatter)
                .await
                .with_context(|| format!("Failed to analyze {}", file))?
        }
        Command::Status => commands::execute_status(&config, api_key, &formatter).await?,
        Command::Config(args) => {
            commands::execute_config(args, &config, &path, &formatter)?;
            true
        }
    };

    Ok(ok)
}

/// Log to stderr; `RUST_LOG` applies unless `--verbose` is given.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}
