//! Model-service sentiment classification
//!
//! Delegates scoring to an external text-classification endpoint. Any
//! transport failure, bad status, or response-shape problem is reported as
//! `ClassifierUnavailable`; the caller degrades to "no sentiment data".

use super::SentimentClassifier;
use crate::error::{RadarError, Result};
use crate::types::SentimentLabel;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub struct ServiceClassifier {
    http: Client,
    url: String,
    token: Option<String>,
}

#[derive(Debug, Serialize)]
struct ClassifyRequest<'a> {
    inputs: &'a [String],
}

/// One candidate label with its confidence, as returned per input text.
#[derive(Debug, Deserialize)]
struct LabelScore {
    label: String,
    score: f64,
}

impl ServiceClassifier {
    pub fn new(url: String, token: Option<String>, timeout_secs: u64) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| RadarError::ClassifierUnavailable(e.to_string()))?;

        Ok(Self { http, url, token })
    }

    fn map_label(raw: &str) -> SentimentLabel {
        let lower = raw.to_lowercase();
        if lower.contains("pos") {
            SentimentLabel::Positive
        } else if lower.contains("neg") {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

#[async_trait]
impl SentimentClassifier for ServiceClassifier {
    async fn classify(&self, reviews: &[String]) -> Result<Vec<SentimentLabel>> {
        if reviews.is_empty() {
            return Ok(Vec::new());
        }

        let mut request = self.http.post(&self.url).json(&ClassifyRequest { inputs: reviews });
        if let Some(token) = &self.token {
            request = request.header("Authorization", format!("Bearer {token}"));
        }

        let response = request
            .send()
            .await
            .map_err(|e| RadarError::ClassifierUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RadarError::ClassifierUnavailable(format!(
                "service returned HTTP {}",
                status.as_u16()
            )));
        }

        // One list of candidate labels per input text.
        let scored: Vec<Vec<LabelScore>> = response
            .json()
            .await
            .map_err(|e| RadarError::ClassifierUnavailable(e.to_string()))?;

        if scored.len() != reviews.len() {
            return Err(RadarError::ClassifierUnavailable(format!(
                "expected {} results, got {}",
                reviews.len(),
                scored.len()
            )));
        }

        Ok(scored
            .iter()
            .map(|candidates| {
                candidates
                    .iter()
                    .max_by(|a, b| a.score.total_cmp(&b.score))
                    .map(|best| Self::map_label(&best.label))
                    .unwrap_or(SentimentLabel::Neutral)
            })
            .collect())
    }

    fn name(&self) -> &str {
        "service"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_label_mapping() {
        assert_eq!(
            ServiceClassifier::map_label("POSITIVE"),
            SentimentLabel::Positive
        );
        assert_eq!(
            ServiceClassifier::map_label("negative"),
            SentimentLabel::Negative
        );
        assert_eq!(
            ServiceClassifier::map_label("NEUTRAL"),
            SentimentLabel::Neutral
        );
        assert_eq!(
            ServiceClassifier::map_label("LABEL_1"),
            SentimentLabel::Neutral
        );
    }

    #[tokio::test]
    async fn test_empty_batch_skips_network() {
        // Unroutable endpoint: an empty batch must return without a request.
        let classifier =
            ServiceClassifier::new("http://192.0.2.1/classify".to_string(), None, 1).unwrap();
        let labels = classifier.classify(&[]).await.unwrap();
        assert!(labels.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unavailable() {
        let classifier =
            ServiceClassifier::new("http://127.0.0.1:9/classify".to_string(), None, 1).unwrap();
        let err = classifier
            .classify(&["great".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, RadarError::ClassifierUnavailable(_)));
    }
}
