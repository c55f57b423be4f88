use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::core::dataset::TrainingRecord;
use crate::core::features::{FeatureVector, NUM_FEATURES};
use crate::error::{CosechaError, Result};
use crate::forest::tree::{TreeNode, TreeParameters, argmax};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RandomForestParameters {
    pub trees: usize,
    pub tree: TreeParameters,
    pub seed: u64,
}

impl Default for RandomForestParameters {
    fn default() -> Self {
        Self {
            trees: 100,
            tree: TreeParameters::default(),
            seed: 42,
        }
    }
}

/// A bagged ensemble of classification trees over the seven-feature record.
///
/// Each tree trains on a bootstrap resample of the training split with a
/// random feature subset considered at every split point. Prediction is a
/// majority vote; the probability estimate for a class is its vote fraction.
/// Immutable once fitted; never updated online.
#[derive(Debug, Serialize, Deserialize)]
pub struct RandomForest {
    parameters: RandomForestParameters,
    classes: Vec<String>,
    trees: Vec<TreeNode>,
}

impl RandomForest {
    /// Fits the ensemble. Deterministic for a given record set, parameter
    /// set, and seed: one sequential PRNG drives every bootstrap draw and
    /// feature subset.
    pub fn fit(records: &[TrainingRecord], parameters: RandomForestParameters) -> Result<Self> {
        if records.is_empty() {
            return Err(CosechaError::Schema("cannot fit on an empty record set".into()));
        }
        if parameters.trees == 0 {
            return Err(CosechaError::Input("ensemble needs at least one tree".into()));
        }

        let classes = discover_classes(records);
        let labels: Vec<usize> = records
            .iter()
            .map(|r| {
                classes
                    .binary_search(&r.label)
                    .expect("label discovered above")
            })
            .collect();
        let rows: Vec<[f64; NUM_FEATURES]> =
            records.iter().map(|r| r.features.values()).collect();

        let mut rng = StdRng::seed_from_u64(parameters.seed);
        let mut trees = Vec::with_capacity(parameters.trees);
        for _ in 0..parameters.trees {
            let sample = bootstrap_sample(records.len(), &mut rng);
            trees.push(TreeNode::fit(
                &rows,
                &labels,
                &sample,
                classes.len(),
                &parameters.tree,
                &mut rng,
            ));
        }

        Ok(Self {
            parameters,
            classes,
            trees,
        })
    }

    /// Known labels in the forest's stable (sorted) ordering. Probability
    /// vectors are indexed against this slice.
    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn parameters(&self) -> &RandomForestParameters {
        &self.parameters
    }

    /// Raw vote counts per class, one vote per tree.
    pub fn votes_for(&self, features: &FeatureVector) -> Vec<f64> {
        let values = features.values();
        let mut votes = vec![0.0; self.classes.len()];
        for tree in &self.trees {
            votes[tree.vote_for(&values)] += 1.0;
        }
        votes
    }

    /// Vote fractions per class, summing to 1.0 over `classes()`.
    pub fn predict_proba(&self, features: &FeatureVector) -> Vec<f64> {
        let mut votes = self.votes_for(features);
        let total: f64 = votes.iter().sum();
        if total > 0.0 {
            for v in &mut votes {
                *v /= total;
            }
        }
        votes
    }

    /// Majority-vote label.
    pub fn predict_label(&self, features: &FeatureVector) -> &str {
        &self.classes[argmax(&self.votes_for(features))]
    }
}

fn discover_classes(records: &[TrainingRecord]) -> Vec<String> {
    let mut classes: Vec<String> = records.iter().map(|r| r.label.clone()).collect();
    classes.sort();
    classes.dedup();
    classes
}

fn bootstrap_sample(len: usize, rng: &mut StdRng) -> Vec<usize> {
    (0..len).map(|_| rng.random_range(0..len)).collect()
}
