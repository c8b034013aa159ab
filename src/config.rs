//! Configuration management

use crate::error::{RadarError, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub data: DataConfig,
    #[serde(default)]
    pub sentiment: SentimentConfig,
    #[serde(default)]
    pub forecast: ForecastConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub slack: SlackConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Competitor pricing/discount CSV path
    pub competitor_csv: String,
    /// Customer reviews CSV path
    pub reviews_csv: String,
    /// Reviews are clipped to this many characters before classification
    #[serde(default = "default_review_max_len")]
    pub review_max_len: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SentimentConfig {
    /// Scoring policy: "lexicon" (deterministic, offline) or "service"
    pub policy: String,
    /// Text-classification endpoint (service policy only)
    pub service_url: Option<String>,
    /// Bearer token for the classification service
    pub service_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastConfig {
    /// Number of future days to predict
    #[serde(default = "default_horizon")]
    pub horizon: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Chat-completion provider ("groq", "openai", "anthropic", "compatible")
    pub provider: String,
    /// API key (bearer token)
    pub api_key: String,
    /// Model name
    pub model: Option<String>,
    /// Base URL override for OpenAI-compatible endpoints
    pub base_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SlackConfig {
    /// Incoming webhook URL; delivery is disabled when absent
    pub webhook_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_review_max_len() -> usize {
    512
}

fn default_horizon() -> usize {
    5
}

fn default_temperature() -> f64 {
    0.7
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for SentimentConfig {
    fn default() -> Self {
        Self {
            policy: "lexicon".to_string(),
            service_url: None,
            service_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            horizon: default_horizon(),
        }
    }
}

impl Config {
    /// Load configuration from file, with environment overrides
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path.as_ref().to_str().unwrap()))
            .add_source(config::Environment::with_prefix("RADAR"))
            .build()?;

        let config: Config = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Load from default locations
    pub fn load_default() -> anyhow::Result<Self> {
        let paths = ["config.toml", "~/.config/competitor-radar/config.toml"];

        for path in paths {
            let expanded = shellexpand::tilde(path);
            if Path::new(expanded.as_ref()).exists() {
                return Self::load(expanded.as_ref());
            }
        }

        anyhow::bail!("No configuration file found")
    }

    /// Startup-time validation; a missing API key is fatal.
    pub fn validate(&self) -> Result<()> {
        if self.llm.api_key.trim().is_empty() {
            return Err(RadarError::Config(
                "llm.api_key is required; check your secrets configuration".to_string(),
            ));
        }
        if self.sentiment.policy == "service" && self.sentiment.service_url.is_none() {
            return Err(RadarError::Config(
                "sentiment.service_url is required for the service policy".to_string(),
            ));
        }
        if self.forecast.horizon == 0 {
            return Err(RadarError::Config(
                "forecast.horizon must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
