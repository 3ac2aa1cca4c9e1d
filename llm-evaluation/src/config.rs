//! Configuration management for the evaluation harness
//!
//! Two sources feed the harness:
//! - an optional TOML file with provider endpoints, judge overrides and
//!   runner limits (every field has a default), and
//! - the process environment, which must provide the judge credential
//!   (`OPENAI_API_KEY`) and the judge model (`DEFAULT_MODEL`).
//!
//! Components never read the environment themselves; the binary resolves
//! an [`EnvConfig`] once and passes it down.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_MODEL_ENV: &str = "DEFAULT_MODEL";

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_providers")]
    pub providers: BTreeMap<String, ProviderConfig>,
    #[serde(default)]
    pub judge: JudgeConfig,
    #[serde(default)]
    pub runner: RunnerSettings,
}

/// Provider-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Override of the provider's API endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Replaces the built-in model list when non-empty
    #[serde(default)]
    pub available_models: Vec<String>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
            max_tokens: default_max_tokens(),
            available_models: Vec::new(),
        }
    }
}

/// LLM judge overrides
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JudgeConfig {
    /// Judge model; falls back to `DEFAULT_MODEL`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

/// Test runner limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerSettings {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// 1 keeps test cases strictly sequential
    #[serde(default = "default_parallel_requests")]
    pub parallel_requests: usize,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            parallel_requests: default_parallel_requests(),
        }
    }
}

fn default_true() -> bool { true }
fn default_max_tokens() -> u32 { 4096 }
fn default_timeout_ms() -> u64 { 120_000 }
fn default_parallel_requests() -> usize { 1 }

fn default_providers() -> BTreeMap<String, ProviderConfig> {
    ["openai", "anthropic", "gemini"]
        .into_iter()
        .map(|name| (name.to_string(), ProviderConfig::default()))
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            judge: JudgeConfig::default(),
            runner: RunnerSettings::default(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&content)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load an explicit file, or fall back to the default search path
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let config = Self::from_file(path)?;
                tracing::info!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            None => Ok(Self::load_or_default()),
        }
    }

    /// Load from default config location or return defaults
    pub fn load_or_default() -> Self {
        let config_paths = ["config/llm-eval.toml", "llm-evaluation/config/llm-eval.toml"];

        for path in &config_paths {
            if Path::new(path).exists() {
                match Self::from_file(path) {
                    Ok(config) => {
                        tracing::info!("Loaded configuration from {}", path);
                        return config;
                    }
                    Err(e) => tracing::warn!("Ignoring {}: {}", path, e),
                }
            }
        }

        tracing::debug!("Using default configuration");
        Self::default()
    }

    /// Save configuration to a TOML file
    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get a specific provider config
    pub fn get_provider(&self, key: &str) -> Option<&ProviderConfig> {
        self.providers.get(key)
    }
}

/// Judge credential and model, sourced from the environment
#[derive(Clone)]
pub struct EnvConfig {
    pub api_key: String,
    pub default_model: String,
}

impl std::fmt::Debug for EnvConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvConfig")
            .field("api_key", &"<redacted>")
            .field("default_model", &self.default_model)
            .finish()
    }
}

impl EnvConfig {
    /// Read from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read through an arbitrary lookup; empty values count as missing
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::MissingEnv(name.to_string()))
        };

        Ok(Self {
            api_key: get(API_KEY_ENV)?,
            default_model: get(DEFAULT_MODEL_ENV)?,
        })
    }

    /// Judge model after applying the file override
    pub fn judge_model<'a>(&'a self, config: &'a Config) -> &'a str {
        config
            .judge
            .model
            .as_deref()
            .unwrap_or(&self.default_model)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("{0} not found in environment variables")]
    MissingEnv(String),
}
