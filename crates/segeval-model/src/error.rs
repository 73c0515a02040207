use std::path::PathBuf;

use thiserror::Error;

/// The error type for model construction, loading and prediction.
#[derive(Error, Debug)]
pub enum ModelError {
    /// The model configuration is logically inconsistent.
    #[error("invalid model configuration: {reason}")]
    InvalidConfiguration {
        /// Why the configuration was rejected.
        reason: String,
    },

    /// Input array does not fit the model.
    #[error("invalid input shape: expected {expected}, got {actual:?}")]
    InvalidInputShape {
        /// Human-readable description of the accepted shape.
        expected: String,
        /// The shape that was supplied.
        actual: Vec<usize>,
    },

    /// Weight file extension is not one we can read.
    #[error("unsupported weight file format: {format}")]
    UnsupportedFormat {
        /// The offending extension.
        format: String,
    },

    /// Reading a weight file failed.
    #[error("failed to load weights from {}: {reason}", path.display())]
    WeightLoading {
        /// The weight file.
        path: PathBuf,
        /// The recorder's error message.
        reason: String,
    },

    /// Writing a weight file failed.
    #[error("failed to save weights to {}: {reason}", path.display())]
    WeightSaving {
        /// The weight file.
        path: PathBuf,
        /// The recorder's error message.
        reason: String,
    },

    /// Converting between tensors and arrays failed.
    #[error("tensor conversion failed: {reason}")]
    TensorConversion {
        /// Description of the failure.
        reason: String,
    },
}

/// A specialized `Result` type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;
