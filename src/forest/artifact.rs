use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CosechaError, Result};
use crate::forest::random_forest::RandomForest;

/// Bumped whenever the serialized forest layout changes. There is no
/// cross-version load path: an artifact is only readable by the version
/// that wrote it.
pub const ARTIFACT_VERSION: u32 = 1;

/// The on-disk model envelope: the fitted forest plus enough metadata to
/// refuse artifacts we did not write. Write-once at training time, read-only
/// everywhere else.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub format_version: u32,
    pub trained_at: String,
    pub forest: RandomForest,
}

impl ModelArtifact {
    pub fn new(forest: RandomForest) -> Self {
        Self {
            format_version: ARTIFACT_VERSION,
            trained_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            forest,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);
        serde_json::to_writer(writer, self)
            .map_err(|e| CosechaError::Io(std::io::Error::other(e)))
    }

    /// Loads and verifies an artifact. Every failure mode here is fatal to
    /// the process that needed the model; there is no untrained fallback.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            CosechaError::ModelLoad(format!("cannot open '{}': {e}", path.display()))
        })?;
        let reader = BufReader::new(file);
        let artifact: ModelArtifact = serde_json::from_reader(reader).map_err(|e| {
            CosechaError::ModelLoad(format!("corrupt artifact '{}': {e}", path.display()))
        })?;

        if artifact.format_version != ARTIFACT_VERSION {
            return Err(CosechaError::ModelLoad(format!(
                "artifact version {} does not match supported version {ARTIFACT_VERSION}",
                artifact.format_version
            )));
        }
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    use crate::core::dataset::TrainingRecord;
    use crate::core::features::FeatureVector;
    use crate::forest::random_forest::RandomForestParameters;

    fn fitted_forest() -> RandomForest {
        let records: Vec<TrainingRecord> = (0..10)
            .map(|i| TrainingRecord {
                features: FeatureVector::new(
                    if i % 2 == 0 { 80.0 } else { 20.0 } + i as f64,
                    40.0,
                    40.0,
                    22.0,
                    70.0,
                    6.5,
                    150.0,
                ),
                label: if i % 2 == 0 { "rice" } else { "maize" }.to_string(),
            })
            .collect();
        let parameters = RandomForestParameters {
            trees: 10,
            ..RandomForestParameters::default()
        };
        RandomForest::fit(&records, parameters).unwrap()
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");

        let artifact = ModelArtifact::new(fitted_forest());
        artifact.save(&path).unwrap();

        let loaded = ModelArtifact::load(&path).unwrap();
        assert_eq!(loaded.format_version, ARTIFACT_VERSION);
        assert_eq!(loaded.forest.classes(), artifact.forest.classes());
        assert_eq!(loaded.trained_at, artifact.trained_at);
    }

    #[test]
    fn missing_artifact_is_a_load_error() {
        let err = ModelArtifact::load(Path::new("no/such/model.json")).unwrap_err();
        assert!(matches!(err, CosechaError::ModelLoad(_)));
    }

    #[test]
    fn corrupt_artifact_is_a_load_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");
        let mut f = File::create(&path).unwrap();
        f.write_all(b"{ not json").unwrap();

        let err = ModelArtifact::load(&path).unwrap_err();
        assert!(matches!(err, CosechaError::ModelLoad(_)));
    }

    #[test]
    fn version_mismatch_is_a_load_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.json");

        let mut artifact = ModelArtifact::new(fitted_forest());
        artifact.format_version = ARTIFACT_VERSION + 1;
        artifact.save(&path).unwrap();

        let err = ModelArtifact::load(&path).unwrap_err();
        assert!(err.to_string().contains("version"), "{err}");
    }
}
