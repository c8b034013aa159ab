//! Competitor Radar
//!
//! A competitor pricing intelligence pipeline: loads competitor price and
//! review tables, classifies review sentiment, forecasts discount trends,
//! and turns both into LLM-generated strategy recommendations that can be
//! relayed to Slack.

pub mod config;
pub mod data;
pub mod error;
pub mod forecast;
pub mod llm;
pub mod notify;
pub mod pipeline;
pub mod sentiment;
pub mod types;

pub use error::{RadarError, Result};
