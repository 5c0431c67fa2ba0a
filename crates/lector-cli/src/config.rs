//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use lector_analyzer::AnalyzerConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name
    #[serde(default = "default_profile")]
    pub active_profile: String,

    /// Available model profiles
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// Pipeline configuration
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
}

/// Model backend profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Backend kind
    pub provider: Provider,

    /// Base URL of the backend
    pub base_url: String,

    /// Model name
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Supported model backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Local Ollama server
    Ollama,
    /// OpenAI-compatible chat completions API
    OpenAi,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// Compact JSON
    Json,
    /// Indented JSON
    Pretty,
}

impl Config {
    /// Default configuration file path (`~/.lector/config.toml`).
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".lector").join("config.toml"))
    }

    /// Load configuration from `path`, or the defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.analyzer.validate().map_err(CliError::Config)?;
        Ok(config)
    }

    /// Save configuration to `path`, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, self.to_toml()?)?;
        Ok(())
    }

    /// Serialize to TOML.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Get the active profile.
    pub fn get_active_profile(&self) -> Result<&Profile> {
        self.profiles
            .get(&self.active_profile)
            .ok_or_else(|| CliError::Config(format!("Profile '{}' not found", self.active_profile)))
    }

    /// Switch to a different profile.
    pub fn switch_profile(&mut self, name: String) -> Result<()> {
        if !self.profiles.contains_key(&name) {
            return Err(CliError::Config(format!("Profile '{}' does not exist", name)));
        }
        self.active_profile = name;
        Ok(())
    }
}

impl Profile {
    /// Resolve the API key: explicit value first, then the configured variable.
    pub fn api_key(&self, explicit: Option<&str>) -> Option<String> {
        explicit
            .map(str::to_string)
            .or_else(|| {
                self.api_key_env
                    .as_deref()
                    .and_then(|var| std::env::var(var).ok())
            })
            .filter(|key| !key.trim().is_empty())
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert(
            "default".to_string(),
            Profile {
                provider: Provider::Ollama,
                base_url: "http://localhost:11434".to_string(),
                model: "llama3.1".to_string(),
                api_key_env: None,
                timeout_secs: default_timeout_secs(),
            },
        );
        profiles.insert(
            "openai".to_string(),
            Profile {
                provider: Provider::OpenAi,
                base_url: "https://api.openai.com".to_string(),
                model: "gpt-4o-mini".to_string(),
                api_key_env: Some("OPENAI_API_KEY".to_string()),
                timeout_secs: default_timeout_secs(),
            },
        );

        Self {
            active_profile: "default".to_string(),
            profiles,
            settings: Settings::default(),
            analyzer: AnalyzerConfig::default(),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Pretty,
        }
    }
}

fn default_profile() -> String {
    "default".to_string()
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Pretty
}

fn default_timeout_secs() -> u64 {
    120
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.active_profile, "default");
        assert_eq!(config.get_active_profile().unwrap().provider, Provider::Ollama);
        assert!(config.profiles.contains_key("openai"));
        assert!(config.settings.color);
    }

    #[test]
    fn test_switch_profile() {
        let mut config = Config::default();
        config.switch_profile("openai".to_string()).unwrap();
        assert_eq!(config.get_active_profile().unwrap().provider, Provider::OpenAi);

        assert!(config.switch_profile("nonexistent".to_string()).is_err());
        assert_eq!(config.active_profile, "openai");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.active_profile, "default");
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.analyzer.max_concurrent_chunks = 3;
        config.settings.format = OutputFormat::Table;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.analyzer.max_concurrent_chunks, 3);
        assert_eq!(loaded.settings.format, OutputFormat::Table);
        assert_eq!(loaded.profiles, config.profiles);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
active_profile = "local"

[profiles.local]
provider = "openai"
base_url = "http://localhost:8000"
model = "qwen"

[analyzer]
max_concurrent_chunks = 1
"#,
        )
        .unwrap();

        let config = Config::load_from(&path).unwrap();
        let profile = config.get_active_profile().unwrap();
        assert_eq!(profile.provider, Provider::OpenAi);
        assert_eq!(profile.timeout_secs, 120);
        assert_eq!(config.analyzer.max_concurrent_chunks, 1);
        assert_eq!(config.analyzer.chunk_max_tokens, 2000);
        assert_eq!(config.settings.format, OutputFormat::Pretty);
    }

    #[test]
    fn test_invalid_analyzer_section_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[analyzer]\nbinary_threshold = 0.0\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(CliError::Config(_))));
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let profile = Profile {
            provider: Provider::OpenAi,
            base_url: "http://localhost".to_string(),
            model: "m".to_string(),
            api_key_env: Some("LECTOR_TEST_KEY_THAT_IS_NOT_SET".to_string()),
            timeout_secs: 10,
        };
        assert_eq!(profile.api_key(Some("sk-1")), Some("sk-1".to_string()));
        assert_eq!(profile.api_key(Some("  ")), None);
        assert_eq!(profile.api_key(None), None);
    }
}
