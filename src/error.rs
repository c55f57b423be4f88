use thiserror::Error;

/// Failures across the training, inference, and weather boundaries.
///
/// Training-data problems and artifact problems are fatal to their process;
/// input and upstream problems are recovered at the boundary and surfaced to
/// the caller. Nothing here is ever papered over with a default value.
#[derive(Debug, Error)]
pub enum CosechaError {
    /// The historical dataset does not match the required column set.
    #[error("training data schema mismatch: {0}")]
    Schema(String),

    /// A feature vector the caller supplied cannot be used for prediction.
    #[error("invalid input: {0}")]
    Input(String),

    /// The forecast service is unreachable or answered with a failure.
    #[error("weather data unavailable: {0}")]
    Upstream(String),

    /// The serialized model artifact is missing, corrupt, or incompatible.
    #[error("cannot load model artifact: {0}")]
    ModelLoad(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, CosechaError>;
