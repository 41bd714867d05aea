/*!
common/src/lib.rs

Shared configuration types and output records for feedfinder.

This file provides:
- Config data structures (deserialized from TOML, every section optional)
- An async loader that merges a default file with an override file
- Environment overrides (`PORT`, API key lookup)
- The `FeedSummary` record returned by the HTTP API
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_PORT: u16 = 3030;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_LLM_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const DEFAULT_FAVICON_URL: &str = "https://www.google.com/s2/favicons";

/// A feed that survived validation.
///
/// `rss_url` is always the candidate string exactly as the generator produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSummary {
    pub title: String,
    pub rss_url: String,
    pub icon: String,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub bind: Option<String>,
    pub port: Option<u16>,
}

/// Text-generation service configuration (OpenAI-compatible endpoint)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_url: Option<String>,
    /// Name of the environment variable holding the API key
    pub api_key_env: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub timeout_seconds: Option<u64>,
    pub max_tokens: Option<usize>,
    /// USD per million prompt tokens, used only for the usage log line
    pub input_cost_per_million: Option<f64>,
    /// USD per million completion tokens
    pub output_cost_per_million: Option<f64>,
}

/// Feed validation thresholds and fetch settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    pub min_items: Option<usize>,
    pub max_age_days: Option<i64>,
    pub fetch_timeout_seconds: Option<u64>,
    pub user_agent: Option<String>,
}

/// Favicon lookup service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IconConfig {
    pub base_url: Option<String>,
    pub size: Option<u32>,
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub validation: ValidationConfig,
    #[serde(default)]
    pub icons: IconConfig,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    /// Missing files are skipped, so with neither present every value is defaulted.
    pub async fn load_with_defaults(
        default_path: Option<&Path>,
        override_path: Option<&Path>,
    ) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for path in [default_path, override_path].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse configuration: {}", path.display()))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value
            .try_into()
            .context("Failed to parse merged configuration")?;
        Ok(cfg)
    }

    /// Apply process environment overrides. Currently only `PORT`.
    pub fn apply_env(&mut self) -> Result<()> {
        if let Ok(port) = std::env::var("PORT") {
            let port = port
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT is not a valid port number: {}", port))?;
            self.server.port = Some(port);
        }
        Ok(())
    }

    pub fn port(&self) -> u16 {
        self.server.port.unwrap_or(DEFAULT_PORT)
    }

    pub fn bind(&self) -> &str {
        self.server.bind.as_deref().unwrap_or(DEFAULT_BIND)
    }

    pub fn api_key_env(&self) -> &str {
        self.llm.api_key_env.as_deref().unwrap_or(DEFAULT_API_KEY_ENV)
    }

    /// Read the text-generation credential from the configured environment variable.
    pub fn api_key(&self) -> Result<String> {
        let var = self.api_key_env();
        let key = std::env::var(var)
            .with_context(|| format!("API key env var '{}' is not set", var))?;
        if key.trim().is_empty() {
            anyhow::bail!("API key env var '{}' is empty", var);
        }
        Ok(key)
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}
