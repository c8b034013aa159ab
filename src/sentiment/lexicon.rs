//! Lexicon-based sentiment scoring
//!
//! VADER-style compound scoring tuned for product-review vocabulary.
//! Deterministic and offline; the default classification policy.

use super::SentimentClassifier;
use crate::error::Result;
use crate::types::SentimentLabel;
use async_trait::async_trait;
use std::collections::HashMap;

/// Compound score at or above this is Positive, at or below the negative
/// of it is Negative; everything between is Neutral.
const LABEL_THRESHOLD: f64 = 0.05;

/// Word-level scorer producing a compound polarity in [-1, 1].
pub struct LexiconScorer {
    lexicon: HashMap<String, f64>,
    boosters: HashMap<String, f64>,
    negations: Vec<String>,
}

impl LexiconScorer {
    pub fn new() -> Self {
        let mut scorer = Self {
            lexicon: HashMap::new(),
            boosters: HashMap::new(),
            negations: Vec::new(),
        };
        scorer.init_lexicons();
        scorer
    }

    fn init_lexicons(&mut self) {
        // General sentiment vocabulary
        let general = [
            ("good", 0.5),
            ("great", 0.7),
            ("excellent", 0.8),
            ("amazing", 0.8),
            ("awesome", 0.7),
            ("fantastic", 0.8),
            ("wonderful", 0.7),
            ("best", 0.8),
            ("love", 0.6),
            ("like", 0.3),
            ("happy", 0.6),
            ("perfect", 0.8),
            ("beautiful", 0.6),
            ("recommend", 0.6),
            ("recommended", 0.6),
            ("satisfied", 0.6),
            ("impressed", 0.6),
            ("worth", 0.4),
            ("positive", 0.5),
            ("bad", -0.5),
            ("terrible", -0.8),
            ("awful", -0.7),
            ("horrible", -0.8),
            ("poor", -0.5),
            ("worst", -0.8),
            ("hate", -0.7),
            ("dislike", -0.4),
            ("disappointed", -0.6),
            ("disappointing", -0.6),
            ("useless", -0.7),
            ("negative", -0.5),
            ("waste", -0.6),
            ("avoid", -0.5),
            ("regret", -0.6),
        ];

        // Shopping-specific vocabulary
        let shopping = [
            ("bargain", 0.6),
            ("durable", 0.5),
            ("sturdy", 0.5),
            ("comfortable", 0.5),
            ("reliable", 0.5),
            ("fast", 0.4),
            ("quick", 0.3),
            ("value", 0.4),
            ("overpriced", -0.6),
            ("expensive", -0.3),
            ("cheap", -0.3),
            ("flimsy", -0.6),
            ("broken", -0.7),
            ("broke", -0.6),
            ("defective", -0.8),
            ("faulty", -0.7),
            ("damaged", -0.6),
            ("refund", -0.5),
            ("return", -0.3),
            ("returned", -0.4),
            ("scam", -0.9),
            ("fake", -0.7),
            ("misleading", -0.6),
            ("slow", -0.4),
            ("late", -0.4),
            ("delayed", -0.4),
        ];

        for (word, score) in general.iter().chain(shopping.iter()) {
            self.lexicon.insert(word.to_string(), *score);
        }

        let boosters = [
            ("very", 1.3),
            ("really", 1.3),
            ("extremely", 1.5),
            ("absolutely", 1.4),
            ("completely", 1.4),
            ("totally", 1.3),
            ("so", 1.2),
            ("super", 1.3),
            ("incredibly", 1.4),
            ("highly", 1.3),
        ];

        for (word, factor) in boosters {
            self.boosters.insert(word.to_string(), factor);
        }

        self.negations = [
            "not", "no", "never", "none", "neither", "nothing", "isn't", "wasn't", "aren't",
            "doesn't", "don't", "didn't", "won't", "wouldn't", "can't", "cannot", "couldn't",
            "shouldn't",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
    }

    /// Compound polarity of one review in [-1, 1].
    pub fn compound(&self, text: &str) -> f64 {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower.split_whitespace().collect();

        let mut scores: Vec<f64> = Vec::new();
        for (i, word) in words.iter().enumerate() {
            let cleaned = clean_word(word);
            if let Some(&score) = self.lexicon.get(&cleaned) {
                scores.push(self.apply_modifiers(&words, i, score));
            }
        }

        if scores.is_empty() {
            return 0.0;
        }

        normalize(scores.iter().sum())
    }

    /// Scan up to 3 preceding words for boosters and negations.
    fn apply_modifiers(&self, words: &[&str], index: usize, mut score: f64) -> f64 {
        let start = index.saturating_sub(3);
        for prev in &words[start..index] {
            let prev = clean_word(prev);
            if let Some(&factor) = self.boosters.get(&prev) {
                score *= factor;
            }
            if self.negations.contains(&prev) {
                score *= -0.5; // flip and dampen
            }
        }
        score.clamp(-1.0, 1.0)
    }
}

impl Default for LexiconScorer {
    fn default() -> Self {
        Self::new()
    }
}

fn clean_word(word: &str) -> String {
    word.chars()
        .filter(|c| c.is_alphanumeric() || *c == '\'' || *c == '-')
        .collect::<String>()
        .to_lowercase()
}

fn normalize(score: f64) -> f64 {
    let alpha = 15.0;
    score / (score.abs() + alpha).sqrt()
}

/// The lexicon classification policy.
pub struct LexiconClassifier {
    scorer: LexiconScorer,
}

impl LexiconClassifier {
    pub fn new() -> Self {
        Self {
            scorer: LexiconScorer::new(),
        }
    }

    pub fn label_for(&self, compound: f64) -> SentimentLabel {
        if compound >= LABEL_THRESHOLD {
            SentimentLabel::Positive
        } else if compound <= -LABEL_THRESHOLD {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

impl Default for LexiconClassifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SentimentClassifier for LexiconClassifier {
    async fn classify(&self, reviews: &[String]) -> Result<Vec<SentimentLabel>> {
        Ok(reviews
            .iter()
            .map(|review| self.label_for(self.scorer.compound(review)))
            .collect())
    }

    fn name(&self) -> &str {
        "lexicon"
    }
}
