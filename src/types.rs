//! Core domain types shared across the pipeline

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One scraped competitor observation: a product's price and discount on a day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompetitorRecord {
    pub title: String,
    pub date: NaiveDate,
    /// Unit price; unparseable values coerce to 0 at load time.
    pub price: Decimal,
    /// Discount percentage, parsed from a possibly "%"-suffixed string.
    pub discount_percent: Decimal,
    /// Same-day adjusted-discount estimate, filled in by the regressor.
    pub predicted_discount: Option<Decimal>,
}

/// One customer review, truncated to the configured maximum length at load.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub title: String,
    pub text: String,
}

/// Sentiment label assigned to a single review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SentimentLabel {
    Positive,
    Neutral,
    Negative,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SentimentLabel::Positive => write!(f, "Positive"),
            SentimentLabel::Neutral => write!(f, "Neutral"),
            SentimentLabel::Negative => write!(f, "Negative"),
        }
    }
}

/// Per-label counts over one product's classified reviews.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentSummary {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

impl SentimentSummary {
    pub fn from_labels(labels: &[SentimentLabel]) -> Self {
        let mut summary = Self::default();
        for label in labels {
            match label {
                SentimentLabel::Positive => summary.positive += 1,
                SentimentLabel::Neutral => summary.neutral += 1,
                SentimentLabel::Negative => summary.negative += 1,
            }
        }
        summary
    }

    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.negative
    }
}

impl fmt::Display for SentimentSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Positive: {}, Neutral: {}, Negative: {}",
            self.positive, self.neutral, self.negative
        )
    }
}

/// One forecasted future observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub predicted_discount: Decimal,
}

/// Free-text strategy recommendation for one product.
///
/// The text is expected to contain pricing strategy, promotional ideas and
/// customer satisfaction sections, but the generating service's output is
/// carried verbatim and never validated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub product: String,
    pub text: String,
    pub generated_at: DateTime<Utc>,
}
