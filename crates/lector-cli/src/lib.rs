//! Lector CLI library.
//!
//! This library provides the core functionality for the Lector command-line interface,
//! including configuration management, model client selection, command execution,
//! and output formatting.

pub mod cli;
pub mod client;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::{Cli, Command};
pub use client::ProfileClient;
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
