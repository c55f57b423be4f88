use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::core::features::NUM_FEATURES;

/// Growth limits for a single tree. The forest shares one value across all
/// of its members.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TreeParameters {
    /// `None` grows until leaves are pure or too small to split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    /// Number of candidate features drawn (without replacement) at each split.
    pub feature_subset: usize,
}

impl Default for TreeParameters {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            // ceil(sqrt(7)) = 3 candidate features per split
            feature_subset: (NUM_FEATURES as f64).sqrt().ceil() as usize,
        }
    }
}

/// A fitted classification tree. Internal nodes route on one feature against
/// a threshold; leaves hold the training-class distribution observed there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
    },
    Leaf {
        distribution: Vec<f64>,
    },
}

impl TreeNode {
    /// Fits a tree on the rows selected by `indices` (bootstrap sample).
    pub fn fit(
        rows: &[[f64; NUM_FEATURES]],
        labels: &[usize],
        indices: &[usize],
        num_classes: usize,
        parameters: &TreeParameters,
        rng: &mut StdRng,
    ) -> TreeNode {
        grow(rows, labels, indices, num_classes, parameters, 0, rng)
    }

    /// Routes one observation to its leaf distribution.
    pub fn distribution_for(&self, values: &[f64; NUM_FEATURES]) -> &[f64] {
        match self {
            TreeNode::Leaf { distribution } => distribution,
            TreeNode::Split {
                feature,
                threshold,
                left,
                right,
            } => {
                if values[*feature] <= *threshold {
                    left.distribution_for(values)
                } else {
                    right.distribution_for(values)
                }
            }
        }
    }

    /// The majority class at the routed leaf; ties resolve to the lowest
    /// class index, keeping predictions stable across runs.
    pub fn vote_for(&self, values: &[f64; NUM_FEATURES]) -> usize {
        argmax(self.distribution_for(values))
    }
}

pub fn argmax(distribution: &[f64]) -> usize {
    let mut best = 0;
    for (i, &v) in distribution.iter().enumerate() {
        if v > distribution[best] {
            best = i;
        }
    }
    best
}

fn grow(
    rows: &[[f64; NUM_FEATURES]],
    labels: &[usize],
    indices: &[usize],
    num_classes: usize,
    parameters: &TreeParameters,
    depth: usize,
    rng: &mut StdRng,
) -> TreeNode {
    let distribution = class_distribution(labels, indices, num_classes);

    let at_depth_limit = parameters
        .max_depth
        .is_some_and(|limit| depth >= limit);
    if at_depth_limit || indices.len() < parameters.min_samples_split || is_pure(&distribution) {
        return TreeNode::Leaf { distribution };
    }

    let Some(split) = best_split(rows, labels, indices, num_classes, parameters, rng) else {
        return TreeNode::Leaf { distribution };
    };

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .iter()
        .copied()
        .partition(|&i| rows[i][split.feature] <= split.threshold);
    if left_idx.is_empty() || right_idx.is_empty() {
        return TreeNode::Leaf { distribution };
    }

    let left = grow(rows, labels, &left_idx, num_classes, parameters, depth + 1, rng);
    let right = grow(rows, labels, &right_idx, num_classes, parameters, depth + 1, rng);
    TreeNode::Split {
        feature: split.feature,
        threshold: split.threshold,
        left: Box::new(left),
        right: Box::new(right),
    }
}

struct CandidateSplit {
    feature: usize,
    threshold: f64,
    merit: f64,
}

fn best_split(
    rows: &[[f64; NUM_FEATURES]],
    labels: &[usize],
    indices: &[usize],
    num_classes: usize,
    parameters: &TreeParameters,
    rng: &mut StdRng,
) -> Option<CandidateSplit> {
    let subset_len = parameters.feature_subset.clamp(1, NUM_FEATURES);
    let candidates = rand::seq::index::sample(rng, NUM_FEATURES, subset_len);

    let mut best: Option<CandidateSplit> = None;
    for feature in candidates {
        if let Some(split) = best_threshold(rows, labels, indices, num_classes, feature) {
            let improves = best.as_ref().is_none_or(|b| split.merit > b.merit);
            if improves {
                best = Some(split);
            }
        }
    }
    best
}

/// Single sorted sweep over one feature: counts migrate from the right
/// partition to the left, and every boundary between distinct values is a
/// candidate threshold (midpoint).
fn best_threshold(
    rows: &[[f64; NUM_FEATURES]],
    labels: &[usize],
    indices: &[usize],
    num_classes: usize,
    feature: usize,
) -> Option<CandidateSplit> {
    if indices.len() < 2 {
        return None;
    }
    let mut ordered: Vec<(f64, usize)> = indices
        .iter()
        .map(|&i| (rows[i][feature], labels[i]))
        .collect();
    ordered.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut left = vec![0.0; num_classes];
    let mut right = vec![0.0; num_classes];
    for &(_, label) in &ordered {
        right[label] += 1.0;
    }

    let parent_merit = split_merit(&[right.clone()]);
    let mut best: Option<CandidateSplit> = None;

    for window in 0..ordered.len() - 1 {
        let (value, label) = ordered[window];
        left[label] += 1.0;
        right[label] -= 1.0;

        let next_value = ordered[window + 1].0;
        if next_value <= value {
            continue;
        }

        let merit = split_merit(&[left.clone(), right.clone()]);
        if merit <= parent_merit {
            continue;
        }
        let improves = best.as_ref().is_none_or(|b| merit > b.merit);
        if improves {
            best = Some(CandidateSplit {
                feature,
                threshold: (value + next_value) / 2.0,
                merit,
            });
        }
    }
    best
}

pub fn compute_gini(distribution: &[f64], distribution_sum_of_weights: f64) -> f64 {
    let mut gini = 1.0;
    for weight in distribution {
        let rel_freq = weight / distribution_sum_of_weights;
        gini -= rel_freq * rel_freq;
    }
    gini
}

/// Merit of a partition: 1 minus the weighted gini of its branches, so
/// higher is better and a pure partition scores 1.0.
pub fn split_merit(post_split_dists: &[Vec<f64>]) -> f64 {
    let mut total_weight = 0.0;
    let mut dist_weights = Vec::with_capacity(post_split_dists.len());
    for dist in post_split_dists {
        let w: f64 = dist.iter().sum();
        dist_weights.push(w);
        total_weight += w;
    }

    let mut gini = 0.0;
    for (i, dist) in post_split_dists.iter().enumerate() {
        if total_weight > 0.0 && dist_weights[i] > 0.0 {
            gini += (dist_weights[i] / total_weight) * compute_gini(dist, dist_weights[i]);
        }
    }
    1.0 - gini
}

fn class_distribution(labels: &[usize], indices: &[usize], num_classes: usize) -> Vec<f64> {
    let mut distribution = vec![0.0; num_classes];
    for &i in indices {
        distribution[labels[i]] += 1.0;
    }
    distribution
}

fn is_pure(distribution: &[f64]) -> bool {
    distribution.iter().filter(|&&w| w > 0.0).count() <= 1
}
