//! Game configuration loaded from TOML.

use crate::llm_client::{LlmConfig, LlmProvider};
use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Settings for a play session.
///
/// Every field has a default, so an empty or partial file is valid.
#[derive(Debug, Clone, PartialEq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_")]
pub struct GameConfig {
    /// Ask the language model for CPU moves before using the rules.
    #[serde(default)]
    use_oracle: bool,

    /// LLM provider (openai or anthropic).
    #[serde(default = "default_provider")]
    llm_provider: LlmProvider,

    /// LLM model name. Unset means the provider's default model.
    #[serde(default)]
    llm_model: Option<String>,

    /// Maximum tokens for a move suggestion.
    #[serde(default = "default_move_max_tokens")]
    move_max_tokens: u32,

    /// Maximum tokens for a post-game reflection.
    #[serde(default = "default_reflection_max_tokens")]
    reflection_max_tokens: u32,

    /// Seconds to wait for any single oracle request.
    #[serde(default = "default_oracle_timeout_secs")]
    oracle_timeout_secs: u64,

    /// Directory for session log files.
    #[serde(default = "default_log_dir")]
    log_dir: PathBuf,

    /// Pause before the CPU moves, in milliseconds.
    #[serde(default = "default_cpu_delay_ms")]
    cpu_delay_ms: u64,
}

fn default_provider() -> LlmProvider {
    LlmProvider::OpenAI
}

fn default_move_max_tokens() -> u32 {
    10
}

fn default_reflection_max_tokens() -> u32 {
    100
}

fn default_oracle_timeout_secs() -> u64 {
    10
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

fn default_cpu_delay_ms() -> u64 {
    500
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            use_oracle: false,
            llm_provider: default_provider(),
            llm_model: None,
            move_max_tokens: default_move_max_tokens(),
            reflection_max_tokens: default_reflection_max_tokens(),
            oracle_timeout_secs: default_oracle_timeout_secs(),
            log_dir: default_log_dir(),
            cpu_delay_ms: default_cpu_delay_ms(),
        }
    }
}

impl GameConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(use_oracle = config.use_oracle, "Config loaded successfully");
        Ok(config)
    }

    /// Loads the file if it exists, otherwise returns the defaults.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            info!("Config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Oracle request timeout.
    pub fn oracle_timeout(&self) -> Duration {
        Duration::from_secs(self.oracle_timeout_secs)
    }

    /// Pause before each CPU move.
    pub fn cpu_delay(&self) -> Duration {
        Duration::from_millis(self.cpu_delay_ms)
    }

    /// Configured model, or the provider's default.
    pub fn model(&self) -> &str {
        self.llm_model
            .as_deref()
            .unwrap_or_else(|| self.llm_provider.default_model())
    }

    /// Creates LLM configuration from this config.
    /// Requires OPENAI_API_KEY or ANTHROPIC_API_KEY environment variable.
    #[instrument(skip(self), fields(provider = ?self.llm_provider, model = %self.model()))]
    pub fn create_llm_config(&self) -> Result<LlmConfig, ConfigError> {
        self.create_llm_config_with(|var| std::env::var(var).ok())
    }

    /// Like [`create_llm_config`](Self::create_llm_config) with a custom
    /// variable lookup.
    pub fn create_llm_config_with(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<LlmConfig, ConfigError> {
        let var = self.llm_provider.api_key_var();
        let api_key = lookup(var)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                warn!(var, "API key not set");
                ConfigError::new(format!("{} environment variable not set", var))
            })?;

        Ok(LlmConfig::new(
            self.llm_provider,
            api_key,
            self.model().to_string(),
        ))
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
