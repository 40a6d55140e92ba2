//! Error types shared by the data loader, reshaper, trainer and evaluator.

use crate::backend::Shape3;
use thiserror::Error;

/// Error type for every fallible operation in the crate.
#[derive(Debug, Error)]
pub enum SeqLabelError {
    /// A flat sequence does not hold exactly `batch * timesteps * features` values.
    #[error("shape mismatch: shape {shape} needs {expected} values, got {got}")]
    ShapeMismatch {
        shape: Shape3,
        expected: usize,
        got: usize,
    },
    /// Input and target disagree on the number of sequences.
    #[error("batch mismatch: input has {input} sequences, target has {target}")]
    BatchMismatch { input: usize, target: usize },
    /// Input and target disagree on the number of timesteps.
    #[error("timestep mismatch: input has {input} timesteps, target has {target}")]
    TimestepMismatch { input: usize, target: usize },
    /// Feature width differs from what the model or tensor expects.
    #[error("feature mismatch: expected {expected} features, got {got}")]
    FeatureMismatch { expected: usize, got: usize },
    /// A shape that is well-formed but unusable for the requested operation.
    #[error("invalid shape: {0}")]
    InvalidShape(String),
    /// Malformed dataset module text.
    #[error("dataset parse error on line {line}: {message}")]
    Parse { line: usize, message: String },
    /// A required assignment is absent from the dataset source.
    #[error("dataset source is missing `{0}`")]
    MissingField(&'static str),
    /// The dataset holds no sequences.
    #[error("dataset is empty")]
    EmptyDataset,
    /// The dataset cannot report its length, so a full batch cannot be formed.
    #[error("dataset length is unknown")]
    UnknownDatasetLength,
    /// A batch failed to load.
    #[error("data error: {0}")]
    Data(String),
    /// Invalid hyperparameter or configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// I/O error while reading a dataset or configuration file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SeqLabelError>;
