//! Configuration loading, validation, and management for promptwright.
//!
//! Loads configuration from `~/.promptwright/config.toml` with environment
//! variable overrides. Validates all settings at load time.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.promptwright/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the OpenAI-compatible backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used when a compile call does not name one
    #[serde(default = "default_model")]
    pub default_model: String,

    /// System prompt override. Blank means "use the built-in persona".
    #[serde(default)]
    pub system_prompt: String,

    /// Token accounting settings
    #[serde(default)]
    pub completion: CompletionConfig,

    /// Contextual search (retrieval) settings
    #[serde(default)]
    pub contextual_search: ContextualSearchConfig,

    /// Per-model context window overrides (model id -> max tokens)
    #[serde(default)]
    pub models: HashMap<String, usize>,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_model() -> String {
    "gpt-3.5-turbo".into()
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("base_url", &self.base_url)
            .field("default_model", &self.default_model)
            .field("system_prompt", &self.system_prompt)
            .field("completion", &self.completion)
            .field("contextual_search", &self.contextual_search)
            .field("models", &self.models)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    /// Role/framing tokens charged for every message
    #[serde(default = "default_per_message_overhead")]
    pub per_message_overhead: usize,

    /// Tokens subtracted from the model's window to form the budget
    #[serde(default)]
    pub safety_margin: usize,

    /// Context window assumed for models the catalog does not know
    #[serde(default = "default_fallback_max_tokens")]
    pub fallback_max_tokens: usize,
}

fn default_per_message_overhead() -> usize {
    7
}
fn default_fallback_max_tokens() -> usize {
    4097
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            per_message_overhead: default_per_message_overhead(),
            safety_margin: 0,
            fallback_max_tokens: default_fallback_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextualSearchConfig {
    /// Model that rewrites the question into a search query
    #[serde(default = "default_rewrite_model")]
    pub rewrite_model: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    /// Number of chunks folded into the context prompt
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Hits scoring below this are ignored
    #[serde(default)]
    pub min_score: f32,

    /// Timeout applied to each retrieval step
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Location of the JSON index; defaults to `~/.promptwright/index/index.json`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_path: Option<PathBuf>,

    /// Lines per chunk when indexing a directory
    #[serde(default = "default_chunk_lines")]
    pub chunk_lines: usize,
}

fn default_rewrite_model() -> String {
    "gpt-4".into()
}
fn default_embedding_model() -> String {
    "text-embedding-ada-002".into()
}
fn default_top_k() -> usize {
    1
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_chunk_lines() -> usize {
    40
}

impl Default for ContextualSearchConfig {
    fn default() -> Self {
        Self {
            rewrite_model: default_rewrite_model(),
            embedding_model: default_embedding_model(),
            top_k: default_top_k(),
            min_score: 0.0,
            timeout_secs: default_timeout_secs(),
            index_path: None,
            chunk_lines: default_chunk_lines(),
        }
    }
}

impl ContextualSearchConfig {
    /// The configured index path, or the default under the config dir.
    pub fn index_path(&self) -> PathBuf {
        self.index_path
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("index").join("index.json"))
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.promptwright/config.toml).
    ///
    /// Environment variables override the file:
    /// - `PROMPTWRIGHT_API_KEY`, then `OPENAI_API_KEY` (only if no key is configured)
    /// - `PROMPTWRIGHT_MODEL`
    /// - `PROMPTWRIGHT_SYSTEM_PROMPT`
    /// - `PROMPTWRIGHT_BASE_URL`
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from an environment lookup.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.api_key.is_none() {
            self.api_key = lookup("PROMPTWRIGHT_API_KEY").or_else(|| lookup("OPENAI_API_KEY"));
        }
        if let Some(model) = lookup("PROMPTWRIGHT_MODEL") {
            self.default_model = model;
        }
        if let Some(prompt) = lookup("PROMPTWRIGHT_SYSTEM_PROMPT") {
            self.system_prompt = prompt;
        }
        if let Some(url) = lookup("PROMPTWRIGHT_BASE_URL") {
            self.base_url = url;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".promptwright")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.completion.safety_margin >= self.completion.fallback_max_tokens {
            return Err(ConfigError::ValidationError(
                "completion.safety_margin must be smaller than completion.fallback_max_tokens"
                    .into(),
            ));
        }

        if self.contextual_search.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "contextual_search.top_k must be at least 1".into(),
            ));
        }

        if !(-1.0..=1.0).contains(&self.contextual_search.min_score) {
            return Err(ConfigError::ValidationError(
                "contextual_search.min_score must be between -1.0 and 1.0".into(),
            ));
        }

        if self.contextual_search.chunk_lines == 0 {
            return Err(ConfigError::ValidationError(
                "contextual_search.chunk_lines must be at least 1".into(),
            ));
        }

        if let Some((model, _)) = self.models.iter().find(|(_, max)| **max == 0) {
            return Err(ConfigError::ValidationError(format!(
                "models.{model} must declare a non-zero context window"
            )));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            default_model: default_model(),
            system_prompt: String::new(),
            completion: CompletionConfig::default(),
            contextual_search: ContextualSearchConfig::default(),
            models: HashMap::new(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
