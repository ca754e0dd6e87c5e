//! Error types for the car_model crate.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while loading data, fitting, predicting or persisting a pipeline.
#[derive(Debug, Error)]
pub enum ModelError {
    /// I/O failure on a named path.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The dataset could not be parsed.
    #[error("Malformed dataset: {0}")]
    Csv(String),

    /// A required column is absent from the CSV header.
    #[error("Dataset is missing required column `{0}`")]
    MissingColumn(String),

    /// No usable rows were left after cleaning.
    #[error("Dataset has no complete rows")]
    EmptyDataset,

    /// Fit was called with inconsistent or empty inputs.
    #[error("Invalid training data: {0}")]
    InvalidTrainingData(String),

    /// A prediction row has the wrong number of features.
    #[error("Feature width mismatch: got {got}, expected {expected}")]
    FeatureWidth { got: usize, expected: usize },

    /// Artifact (de)serialization failed.
    #[error("Artifact serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The artifact was written by an incompatible version or schema.
    #[error("Incompatible artifact: {0}")]
    IncompatibleArtifact(String),
}

impl ModelError {
    /// Wrap an I/O error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid training data error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidTrainingData(msg.into())
    }
}
