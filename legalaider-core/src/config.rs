//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/legalaider/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/legalaider/` (~/.config/legalaider/)
//! - Data: `$XDG_DATA_HOME/legalaider/` (~/.local/share/legalaider/)
//! - State/Logs: `$XDG_STATE_HOME/legalaider/` (~/.local/state/legalaider/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_DATA_HOME or ~/.local/share
fn xdg_data_home() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/share"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Text-generation provider (required for clustering and extraction)
    #[serde(default)]
    pub llm: Option<LlmConfig>,

    /// Per-conversation analysis settings
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Report generation settings
    #[serde(default)]
    pub report: ReportConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// LLM provider configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// Provider type
    pub provider: LlmProvider,
    /// Model to use
    pub model: String,
    /// API endpoint (optional, uses default for provider)
    pub endpoint: Option<String>,
    /// API key (can also use env var)
    pub api_key: Option<String>,
    /// Per-request time budget in seconds
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
    /// Response token cap (providers that require one)
    #[serde(default = "default_llm_max_tokens")]
    pub max_tokens: u32,
}

/// Supported LLM providers
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    Ollama,
    Claude,
    OpenAI,
}

impl LlmProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmProvider::Ollama => "ollama",
            LlmProvider::Claude => "claude",
            LlmProvider::OpenAI => "openai",
        }
    }

    /// Returns the default endpoint for this provider
    pub fn default_endpoint(&self) -> &'static str {
        match self {
            LlmProvider::Ollama => "http://localhost:11434",
            LlmProvider::Claude => "https://api.anthropic.com",
            LlmProvider::OpenAI => "https://api.openai.com",
        }
    }
}

pub(crate) fn default_llm_timeout_secs() -> u64 {
    60
}

fn default_llm_max_tokens() -> u32 {
    2000
}

/// Analysis batch configuration
#[derive(Debug, Deserialize, Clone)]
pub struct AnalysisConfig {
    /// Worker threads used to analyze records in parallel
    #[serde(default = "default_max_parallelism")]
    pub max_parallelism: usize,

    /// Ask the LLM for topics, questions and complexity before modeling
    #[serde(default)]
    pub extract_insights: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_parallelism: default_max_parallelism(),
            extract_insights: false,
        }
    }
}

fn default_max_parallelism() -> usize {
    4
}

/// Report configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ReportConfig {
    /// Reuse stored clustering responses for identical input
    #[serde(default)]
    pub reuse_cached_clusters: bool,
}

/// Logging configuration
#[derive(Debug, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Maximum number of log files to keep
    #[serde(default = "default_max_log_files")]
    pub max_files: usize,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            max_files: default_max_log_files(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_log_files() -> usize {
    5
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot work
    pub fn validate(&self) -> Result<()> {
        if self.analysis.max_parallelism == 0 {
            return Err(Error::Config(
                "analysis.max_parallelism must be at least 1".to_string(),
            ));
        }
        if self.analysis.extract_insights && self.llm.is_none() {
            return Err(Error::Config(
                "analysis.extract_insights requires an [llm] section".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the configured LLM or a configuration error
    pub fn require_llm(&self) -> Result<&LlmConfig> {
        self.llm.as_ref().ok_or_else(|| {
            Error::Config(format!(
                "an [llm] section is required in {}",
                Self::config_path().display()
            ))
        })
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/legalaider/config.toml` (~/.config/legalaider/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("legalaider").join("config.toml")
    }

    /// Returns the data directory path (for SQLite database)
    ///
    /// `$XDG_DATA_HOME/legalaider/` (~/.local/share/legalaider/)
    pub fn data_dir() -> PathBuf {
        xdg_data_home().join("legalaider")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/legalaider/` (~/.local/state/legalaider/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("legalaider")
    }

    /// Returns the database file path
    ///
    /// `$XDG_DATA_HOME/legalaider/data.db` (~/.local/share/legalaider/data.db)
    pub fn database_path() -> PathBuf {
        Self::data_dir().join("data.db")
    }

    /// Directory holding the daily `legalaider.YYYY-MM-DD.log` files
    pub fn log_dir() -> PathBuf {
        Self::state_dir().join("logs")
    }
}
