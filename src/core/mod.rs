pub mod dataset;
pub mod features;

pub use dataset::{Dataset, LABEL_COLUMN, TrainingRecord};
pub use features::{FEATURE_NAMES, FeatureVector, NUM_FEATURES};
