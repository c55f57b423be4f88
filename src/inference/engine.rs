use std::path::Path;

use crate::core::features::FeatureVector;
use crate::error::{CosechaError, Result};
use crate::forest::artifact::ModelArtifact;
use crate::forest::random_forest::RandomForest;

/// One ranked candidate crop.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub label: String,
    pub probability: f64,
}

/// Serves predictions from one loaded model.
///
/// Constructed once at process startup and passed by reference from there on;
/// the forest is never mutated after load, so shared reads need no
/// coordination. A failed load is fatal to the caller — there is no
/// untrained fallback state.
#[derive(Debug)]
pub struct InferenceEngine {
    forest: RandomForest,
}

impl InferenceEngine {
    pub fn from_artifact_path(path: &Path) -> Result<Self> {
        let artifact = ModelArtifact::load(path)?;
        Ok(Self::new(artifact.forest))
    }

    pub fn new(forest: RandomForest) -> Self {
        Self { forest }
    }

    pub fn classes(&self) -> &[String] {
        self.forest.classes()
    }

    /// The `k` most probable crops, sorted by non-increasing probability.
    /// Ties keep the forest's stable class ordering. `k` larger than the
    /// number of known classes clamps to all of them; `k == 0` is rejected.
    pub fn predict_top_k(&self, features: &FeatureVector, k: usize) -> Result<Vec<Recommendation>> {
        if k == 0 {
            return Err(CosechaError::Input("k must be at least 1".into()));
        }
        features.validate()?;

        let proba = self.forest.predict_proba(features);
        let mut ranked: Vec<Recommendation> = self
            .forest
            .classes()
            .iter()
            .zip(proba)
            .map(|(label, probability)| Recommendation {
                label: label.clone(),
                probability,
            })
            .collect();
        // stable sort keeps class order among equal probabilities
        ranked.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        ranked.truncate(k.min(self.forest.classes().len()));
        Ok(ranked)
    }

    /// The single majority-vote label. Computed from the raw vote counts,
    /// but always agrees with `predict_top_k(features, 1)` since both derive
    /// from the same score distribution.
    pub fn predict_single(&self, features: &FeatureVector) -> Result<String> {
        features.validate()?;
        Ok(self.forest.predict_label(features).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::core::dataset::TrainingRecord;
    use crate::forest::random_forest::RandomForestParameters;

    fn record(label: &str, n: f64, rainfall: f64) -> TrainingRecord {
        TrainingRecord {
            features: FeatureVector::new(n, 40.0, 40.0, 22.0, 70.0, 6.5, rainfall),
            label: label.to_string(),
        }
    }

    fn engine() -> InferenceEngine {
        let mut records = Vec::new();
        for i in 0..15 {
            let jitter = i as f64 * 0.4;
            records.push(record("rice", 85.0 + jitter, 200.0 + jitter));
            records.push(record("maize", 20.0 + jitter, 60.0 + jitter));
            records.push(record("lentil", 50.0 + jitter, 120.0 + jitter));
            records.push(record("cotton", 115.0 + jitter, 80.0 + jitter));
        }
        let parameters = RandomForestParameters {
            trees: 30,
            ..RandomForestParameters::default()
        };
        InferenceEngine::new(RandomForest::fit(&records, parameters).unwrap())
    }

    #[test]
    fn top_k_is_sorted_and_bounded() {
        let engine = engine();
        let probe = record("", 86.0, 203.0).features;

        let top = engine.predict_top_k(&probe, 3).unwrap();
        assert_eq!(top.len(), 3);
        for pair in top.windows(2) {
            assert!(pair[0].probability >= pair[1].probability);
        }
        assert!(top.iter().all(|r| (0.0..=1.0).contains(&r.probability)));
        let reported: f64 = top.iter().map(|r| r.probability).sum();
        assert!(reported <= 1.0 + 1e-9);
    }

    #[test]
    fn k_clamps_to_class_count() {
        let engine = engine();
        let probe = record("", 86.0, 203.0).features;
        let all = engine.predict_top_k(&probe, 99).unwrap();
        assert_eq!(all.len(), engine.classes().len());
    }

    #[test]
    fn k_zero_is_rejected() {
        let engine = engine();
        let probe = record("", 86.0, 203.0).features;
        let err = engine.predict_top_k(&probe, 0).unwrap_err();
        assert!(matches!(err, CosechaError::Input(_)));
    }

    #[test]
    fn single_agrees_with_top_one() {
        let engine = engine();
        for probe in [
            record("", 86.0, 203.0).features,
            record("", 21.0, 61.0).features,
            record("", 51.0, 122.0).features,
            record("", 117.0, 82.0).features,
        ] {
            let single = engine.predict_single(&probe).unwrap();
            let top = engine.predict_top_k(&probe, 1).unwrap();
            assert_eq!(top.len(), 1);
            assert_eq!(single, top[0].label);
        }
    }

    #[test]
    fn inference_is_idempotent() {
        let engine = engine();
        let probe = record("", 51.0, 122.0).features;
        let first = engine.predict_top_k(&probe, 4).unwrap();
        let second = engine.predict_top_k(&probe, 4).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn malformed_features_are_rejected_not_panicked() {
        let engine = engine();
        let mut probe = record("", 51.0, 122.0).features;
        probe.ph = f64::NAN;
        assert!(matches!(
            engine.predict_top_k(&probe, 3),
            Err(CosechaError::Input(_))
        ));
        assert!(matches!(
            engine.predict_single(&probe),
            Err(CosechaError::Input(_))
        ));
    }

    #[test]
    fn matching_cluster_ranks_in_top_three() {
        let engine = engine();
        let probe = FeatureVector::new(90.0, 42.0, 43.0, 22.0, 80.0, 6.5, 200.0);
        let top = engine.predict_top_k(&probe, 3).unwrap();
        let rice = top.iter().find(|r| r.label == "rice");
        assert!(rice.is_some(), "expected rice in top-3, got {top:?}");
        assert!(rice.unwrap().probability > 0.2);
    }
}
