//! Review sentiment classification
//!
//! Two interchangeable scoring policies sit behind one trait: a
//! deterministic lexicon scorer with no network dependency, and a delegating
//! client for an external text-classification service. The pipeline treats
//! service unavailability as "no sentiment data", never as a fatal fault.

pub mod lexicon;
pub mod service;

use crate::config::SentimentConfig;
use crate::error::{RadarError, Result};
use crate::types::SentimentLabel;
use async_trait::async_trait;

pub use lexicon::LexiconClassifier;
pub use service::ServiceClassifier;

/// Maps a batch of review texts to per-review labels, order-preserving and
/// same length as the input. An empty batch yields an empty vec.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    async fn classify(&self, reviews: &[String]) -> Result<Vec<SentimentLabel>>;

    fn name(&self) -> &str;
}

/// Construct the classifier selected by configuration.
pub fn build_classifier(config: &SentimentConfig) -> Result<Box<dyn SentimentClassifier>> {
    match config.policy.as_str() {
        "lexicon" => Ok(Box::new(LexiconClassifier::new())),
        "service" => {
            let url = config.service_url.clone().ok_or_else(|| {
                RadarError::Config("sentiment.service_url is required for the service policy".into())
            })?;
            Ok(Box::new(ServiceClassifier::new(
                url,
                config.service_token.clone(),
                config.timeout_secs,
            )?))
        }
        other => Err(RadarError::Config(format!(
            "unknown sentiment policy: {other}"
        ))),
    }
}
