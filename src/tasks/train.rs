use std::fs;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use cpu_time::ThreadTime;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::core::dataset::{Dataset, TrainingRecord};
use crate::error::{CosechaError, Result};
use crate::forest::artifact::ModelArtifact;
use crate::forest::random_forest::{RandomForest, RandomForestParameters};

/// Fraction of records held out for the accuracy diagnostic.
const TEST_FRACTION: f64 = 0.2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Csv,
}

/// Diagnostics from one training run. Accuracy never gates serialization;
/// it is reported so the operator can judge the artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainReport {
    pub instances: usize,
    pub train_instances: usize,
    pub test_instances: usize,
    pub classes: usize,
    pub test_accuracy: f64,
    pub cpu_seconds: f64,
    pub trained_at: String,
}

impl TrainReport {
    pub fn export(&self, path: &Path, format: ReportFormat) -> Result<()> {
        let body = match format {
            ReportFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| CosechaError::Io(std::io::Error::other(e)))?,
            ReportFormat::Csv => format!(
                "instances,train_instances,test_instances,classes,test_accuracy,cpu_seconds,trained_at\n\
                 {},{},{},{},{},{},{}\n",
                self.instances,
                self.train_instances,
                self.test_instances,
                self.classes,
                self.test_accuracy,
                self.cpu_seconds,
                self.trained_at
            ),
        };
        fs::write(path, body)?;
        Ok(())
    }
}

/// Offline, one-shot training: load the historical CSV, hold out a seeded
/// 20% test split, fit the forest, report held-out accuracy, and serialize
/// the artifact. Any load or schema failure aborts before anything is
/// written.
pub struct TrainTask {
    data_path: PathBuf,
    model_path: PathBuf,
    parameters: RandomForestParameters,
}

impl TrainTask {
    pub fn new(
        data_path: PathBuf,
        model_path: PathBuf,
        parameters: RandomForestParameters,
    ) -> Result<Self> {
        if data_path.as_os_str().is_empty() {
            return Err(CosechaError::Input("data path must not be empty".into()));
        }
        if model_path.as_os_str().is_empty() {
            return Err(CosechaError::Input("model path must not be empty".into()));
        }
        Ok(Self {
            data_path,
            model_path,
            parameters,
        })
    }

    pub fn run(&self) -> Result<TrainReport> {
        let start_cpu = ThreadTime::now();

        let dataset = Dataset::from_csv_path(&self.data_path)?;
        let (train, test) = split_records(&dataset.records, self.parameters.seed);

        let forest = RandomForest::fit(&train, self.parameters.clone())?;
        let test_accuracy = accuracy(&forest, &test);
        let classes = forest.classes().len();

        let artifact = ModelArtifact::new(forest);
        artifact.save(&self.model_path)?;

        Ok(TrainReport {
            instances: dataset.len(),
            train_instances: train.len(),
            test_instances: test.len(),
            classes,
            test_accuracy,
            cpu_seconds: start_cpu.elapsed().as_secs_f64(),
            trained_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        })
    }
}

/// Seeded 80/20 split: shuffling the index order instead of the records
/// keeps the split reproducible for identical data and seed.
fn split_records(records: &[TrainingRecord], seed: u64) -> (Vec<TrainingRecord>, Vec<TrainingRecord>) {
    let mut indices: Vec<usize> = (0..records.len()).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    indices.shuffle(&mut rng);

    let test_len = ((records.len() as f64) * TEST_FRACTION).round() as usize;
    let (test_idx, train_idx) = indices.split_at(test_len);

    let collect = |idx: &[usize]| idx.iter().map(|&i| records[i].clone()).collect();
    (collect(train_idx), collect(test_idx))
}

fn accuracy(forest: &RandomForest, test: &[TrainingRecord]) -> f64 {
    if test.is_empty() {
        return f64::NAN;
    }
    let correct = test
        .iter()
        .filter(|r| forest.predict_label(&r.features) == r.label)
        .count();
    correct as f64 / test.len() as f64
}
