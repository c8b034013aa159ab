//! Same-day adjusted-discount regressor
//!
//! Bagged regression trees over {price, discount} predicting the adjusted
//! discount target `discount + 5% of price`, rounded to 2 decimals. Exposes
//! per-row predictions for display next to the observed values; this is a
//! sanity-check model and feeds nothing downstream.

use crate::error::{RadarError, Result};
use crate::types::CompetitorRecord;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

const N_FEATURES: usize = 2;

/// The regression target for one observation.
pub fn adjusted_target(price: Decimal, discount: Decimal) -> Decimal {
    (discount + price * dec!(0.05)).round_dp(2)
}

#[derive(Debug, Clone)]
pub struct EnsembleConfig {
    pub n_trees: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub seed: u64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        Self {
            n_trees: 50,
            max_depth: 6,
            min_samples_leaf: 2,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
enum TreeNode {
    Leaf(f64),
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
}

impl TreeNode {
    fn predict(&self, sample: &[f64; N_FEATURES]) -> f64 {
        match self {
            TreeNode::Leaf(value) => *value,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if sample[*feature] <= *threshold {
                    left.predict(sample)
                } else {
                    right.predict(sample)
                }
            }
        }
    }
}

#[derive(Debug)]
pub struct DiscountRegressor {
    trees: Vec<TreeNode>,
}

impl DiscountRegressor {
    /// Train on a product's observations. Needs at least two rows.
    pub fn fit(records: &[CompetitorRecord], config: &EnsembleConfig) -> Result<Self> {
        if records.len() < 2 {
            return Err(RadarError::InsufficientHistory {
                observed: records.len(),
                required: 2,
            });
        }

        let samples: Vec<[f64; N_FEATURES]> = records
            .iter()
            .map(|r| {
                [
                    r.price.to_f64().unwrap_or(0.0),
                    r.discount_percent.to_f64().unwrap_or(0.0),
                ]
            })
            .collect();
        let targets: Vec<f64> = records
            .iter()
            .map(|r| {
                adjusted_target(r.price, r.discount_percent)
                    .to_f64()
                    .unwrap_or(0.0)
            })
            .collect();

        let trees = (0..config.n_trees)
            .map(|i| {
                let mut rng = StdRng::seed_from_u64(config.seed.wrapping_add(i as u64));
                let indices: Vec<usize> = (0..samples.len())
                    .map(|_| rng.random_range(0..samples.len()))
                    .collect();
                build_tree(&samples, &targets, &indices, 0, config)
            })
            .collect();

        Ok(Self { trees })
    }

    /// Average prediction across the ensemble, rounded to 2 decimals.
    pub fn predict(&self, price: Decimal, discount: Decimal) -> Decimal {
        let sample = [
            price.to_f64().unwrap_or(0.0),
            discount.to_f64().unwrap_or(0.0),
        ];
        let sum: f64 = self.trees.iter().map(|t| t.predict(&sample)).sum();
        Decimal::from_f64_retain(sum / self.trees.len() as f64)
            .unwrap_or(Decimal::ZERO)
            .round_dp(2)
    }

    /// Fill `predicted_discount` on every record in place.
    pub fn annotate(&self, records: &mut [CompetitorRecord]) {
        for record in records.iter_mut() {
            record.predicted_discount = Some(self.predict(record.price, record.discount_percent));
        }
    }
}

fn build_tree(
    samples: &[[f64; N_FEATURES]],
    targets: &[f64],
    indices: &[usize],
    depth: usize,
    config: &EnsembleConfig,
) -> TreeNode {
    let mean = indices.iter().map(|&i| targets[i]).sum::<f64>() / indices.len() as f64;

    if depth >= config.max_depth || indices.len() < 2 * config.min_samples_leaf {
        return TreeNode::Leaf(mean);
    }

    let Some((feature, threshold)) = best_split(samples, targets, indices, config) else {
        return TreeNode::Leaf(mean);
    };

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| samples[i][feature] <= threshold);

    TreeNode::Split {
        feature,
        threshold,
        left: Box::new(build_tree(samples, targets, &left_idx, depth + 1, config)),
        right: Box::new(build_tree(samples, targets, &right_idx, depth + 1, config)),
    }
}

/// Exhaustive search over midpoint thresholds minimizing the summed squared
/// error of the two children.
fn best_split(
    samples: &[[f64; N_FEATURES]],
    targets: &[f64],
    indices: &[usize],
    config: &EnsembleConfig,
) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64, f64)> = None;

    for feature in 0..N_FEATURES {
        let mut values: Vec<f64> = indices.iter().map(|&i| samples[i][feature]).collect();
        values.sort_by(f64::total_cmp);
        values.dedup();

        for pair in values.windows(2) {
            let threshold = (pair[0] + pair[1]) / 2.0;
            let (left, right): (Vec<&usize>, Vec<&usize>) = indices
                .iter()
                .partition(|&&i| samples[i][feature] <= threshold);
            if left.len() < config.min_samples_leaf || right.len() < config.min_samples_leaf {
                continue;
            }
            let sse = side_sse(targets, &left) + side_sse(targets, &right);
            if best.is_none() || sse < best.unwrap().2 {
                best = Some((feature, threshold, sse));
            }
        }
    }

    best.map(|(feature, threshold, _)| (feature, threshold))
}

fn side_sse(targets: &[f64], indices: &[&usize]) -> f64 {
    let mean = indices.iter().map(|&&i| targets[i]).sum::<f64>() / indices.len() as f64;
    indices
        .iter()
        .map(|&&i| {
            let diff = targets[i] - mean;
            diff * diff
        })
        .sum()
}
