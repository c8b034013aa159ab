//! Recommendation synthesis over chat-completion APIs
//!
//! Builds a deterministic prompt from the product, its forecast and its
//! sentiment summary, sends it to a hosted chat-completion endpoint, and
//! carries the free-text answer back verbatim. One request per call, no
//! retries; every failure mode maps to a labeled [`GenerationError`].

use crate::config::LlmConfig;
use crate::error::{GenerationError, RadarError, Result};
use crate::types::{ForecastPoint, Recommendation, SentimentSummary};
use chrono::{NaiveDate, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::time::Duration;

/// Substituted into the prompt when no sentiment data exists for a product.
pub const NO_SENTIMENT_PLACEHOLDER: &str = "No sentiment insights available.";

/// Supported chat-completion backends. Groq and OpenAI speak the same wire
/// format; Anthropic has its own.
#[derive(Debug, Clone)]
pub enum ChatProvider {
    Groq {
        api_key: String,
        model: String,
    },
    OpenAi {
        api_key: String,
        model: String,
        base_url: String,
    },
    Anthropic {
        api_key: String,
        model: String,
    },
    /// OpenAI-compatible API (vLLM, Ollama, gateways)
    Compatible {
        api_key: Option<String>,
        model: String,
        base_url: String,
    },
}

impl ChatProvider {
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        match config.provider.to_lowercase().as_str() {
            "groq" => Ok(ChatProvider::Groq {
                api_key: config.api_key.clone(),
                model: config
                    .model
                    .clone()
                    .unwrap_or_else(|| "llama3-8b-8192".to_string()),
            }),
            "openai" | "gpt" => Ok(ChatProvider::OpenAi {
                api_key: config.api_key.clone(),
                model: config
                    .model
                    .clone()
                    .unwrap_or_else(|| "gpt-4o-mini".to_string()),
                base_url: config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| "https://api.openai.com".to_string()),
            }),
            "anthropic" | "claude" => Ok(ChatProvider::Anthropic {
                api_key: config.api_key.clone(),
                model: config
                    .model
                    .clone()
                    .unwrap_or_else(|| "claude-sonnet-4-20250514".to_string()),
            }),
            "compatible" | "custom" => Ok(ChatProvider::Compatible {
                api_key: (!config.api_key.is_empty()).then(|| config.api_key.clone()),
                model: config
                    .model
                    .clone()
                    .ok_or_else(|| RadarError::Config("model required for compatible provider".into()))?,
                base_url: config
                    .base_url
                    .clone()
                    .ok_or_else(|| RadarError::Config("base_url required for compatible provider".into()))?,
            }),
            other => Err(RadarError::Config(format!("unknown LLM provider: {other}"))),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ChatProvider::Groq { .. } => "Groq",
            ChatProvider::OpenAi { .. } => "OpenAI",
            ChatProvider::Anthropic { .. } => "Anthropic",
            ChatProvider::Compatible { model, .. } => model,
        }
    }
}

// ============ Request/Response types ============

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ChatMessage>,
    temperature: f64,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    text: String,
}

pub struct RecommendationSynthesizer {
    http: Client,
    provider: ChatProvider,
    temperature: f64,
    timeout_secs: u64,
}

impl RecommendationSynthesizer {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let provider = ChatProvider::from_config(config)?;
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RadarError::Config(e.to_string()))?;

        Ok(Self {
            http,
            provider,
            temperature: config.temperature,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Generate a strategy recommendation for one product.
    ///
    /// An empty forecast fails fast with `MissingInput` before any request
    /// is issued. A missing sentiment summary is softer: the prompt carries
    /// a fixed placeholder instead.
    pub async fn synthesize(
        &self,
        product: &str,
        forecast: &[ForecastPoint],
        sentiment: Option<&SentimentSummary>,
    ) -> Result<Recommendation> {
        if forecast.is_empty() {
            return Err(RadarError::MissingInput(
                "forecast is empty, nothing to reason about".to_string(),
            ));
        }

        let prompt = build_prompt(product, forecast, sentiment, Utc::now().date_naive());
        tracing::debug!(product, provider = self.provider.name(), "requesting recommendation");
        let text = self.call(&prompt).await?;

        Ok(Recommendation {
            product: product.to_string(),
            text,
            generated_at: Utc::now(),
        })
    }

    async fn call(&self, prompt: &str) -> Result<String> {
        match &self.provider {
            ChatProvider::Groq { api_key, model } => {
                self.call_openai_compatible("https://api.groq.com/openai", Some(api_key), model, prompt)
                    .await
            }
            ChatProvider::OpenAi {
                api_key,
                model,
                base_url,
            } => {
                self.call_openai_compatible(base_url, Some(api_key), model, prompt)
                    .await
            }
            ChatProvider::Anthropic { api_key, model } => {
                self.call_anthropic(api_key, model, prompt).await
            }
            ChatProvider::Compatible {
                api_key,
                model,
                base_url,
            } => {
                self.call_openai_compatible(base_url, api_key.as_deref(), model, prompt)
                    .await
            }
        }
    }

    async fn call_openai_compatible(
        &self,
        base_url: &str,
        api_key: Option<&str>,
        model: &str,
        prompt: &str,
    ) -> Result<String> {
        let request = ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.temperature,
        };

        let mut req = self
            .http
            .post(format!("{}/v1/chat/completions", base_url.trim_end_matches('/')))
            .header("content-type", "application/json");
        if let Some(key) = api_key {
            req = req.header("Authorization", format!("Bearer {key}"));
        }

        let resp = req.json(&request).send().await.map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: snippet(&body),
            }
            .into());
        }

        let parsed: ChatResponse = serde_json::from_str(&body)
            .map_err(|e| GenerationError::MalformedBody(format!("{e} in: {}", snippet(&body))))?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| GenerationError::MalformedBody("response had no choices".to_string()).into())
    }

    async fn call_anthropic(&self, api_key: &str, model: &str, prompt: &str) -> Result<String> {
        let request = AnthropicRequest {
            model: model.to_string(),
            max_tokens: 1024,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: self.temperature,
        };

        let resp = self
            .http
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| self.transport_error(e))?;
        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: snippet(&body),
            }
            .into());
        }

        let parsed: AnthropicResponse = serde_json::from_str(&body)
            .map_err(|e| GenerationError::MalformedBody(format!("{e} in: {}", snippet(&body))))?;
        parsed
            .content
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| GenerationError::MalformedBody("response had no content".to_string()).into())
    }

    fn transport_error(&self, e: reqwest::Error) -> RadarError {
        if e.is_timeout() {
            GenerationError::Timeout {
                timeout_secs: self.timeout_secs,
            }
            .into()
        } else {
            GenerationError::Request(e.to_string()).into()
        }
    }
}

/// Deterministic prompt, stable for a given product/forecast/sentiment/date.
fn build_prompt(
    product: &str,
    forecast: &[ForecastPoint],
    sentiment: Option<&SentimentSummary>,
    today: NaiveDate,
) -> String {
    let mut forecast_table = String::new();
    for point in forecast {
        let _ = writeln!(
            forecast_table,
            "{}  {}%",
            point.date, point.predicted_discount
        );
    }

    let sentiment_text = sentiment
        .map(|s| s.to_string())
        .unwrap_or_else(|| NO_SENTIMENT_PLACEHOLDER.to_string());

    format!(
        "You are an expert in e-commerce competitor analysis. Today is {today}. \
Based on the details below, provide strategic recommendations for \"{product}\".\n\
\n\
**Forecasted Competitor Discounts:**\n\
{forecast_table}\n\
**Customer Sentiment:**\n\
{sentiment_text}\n\
\n\
**Task:**\n\
- Identify key pricing trends.\n\
- Suggest optimal pricing and promotional strategies.\n\
- Recommend customer engagement improvements.\n\
\n\
Provide the recommendations in:\n\
1. **Pricing Strategy**\n\
2. **Promotional Campaign Ideas**\n\
3. **Customer Satisfaction Improvements**\n"
    )
}

fn snippet(body: &str) -> String {
    body.chars().take(200).collect()
}
