use std::path::PathBuf;

use segeval_metric::MetricError;
use segeval_model::ModelError;
use segeval_util::UtilError;
use thiserror::Error;

/// The error type for dataset validation and the evaluation pipeline.
#[derive(Error, Debug)]
pub enum SegEvalError {
    /// A batch holds no images.
    #[error("{what} batch is empty")]
    EmptyBatch { what: &'static str },

    /// An array has the wrong rank or layout.
    #[error("invalid {what} shape: expected {expected}, got {actual:?}")]
    InvalidShape {
        what: &'static str,
        expected: &'static str,
        actual: Vec<usize>,
    },

    /// Images and masks (or masks and predictions) disagree on `N, H, W`.
    #[error("shape mismatch: {left_name} {left:?} vs {right_name} {right:?}")]
    ShapeMismatch {
        left_name: &'static str,
        left: Vec<usize>,
        right_name: &'static str,
        right: Vec<usize>,
    },

    /// A mask pixel is neither 0 nor 1.
    #[error("masks must be binary (0-1): found {value} at {position:?}")]
    NonBinaryMask { value: u8, position: [usize; 3] },

    /// A model output falls outside `[0, 1]` or is NaN.
    #[error("model outputs out of [0,1] range: {value} at {position:?}")]
    ProbabilityOutOfRange { value: f32, position: [usize; 3] },

    /// Image data contains NaN or infinite values.
    #[error("image values must be finite: found {value} at {position:?}")]
    NonFiniteImage { value: f32, position: [usize; 4] },

    /// Writing a figure or report failed.
    #[error("failed to write {}: {reason}", path.display())]
    Output { path: PathBuf, reason: String },

    #[error(transparent)]
    Util(#[from] UtilError),

    #[error(transparent)]
    Metric(#[from] MetricError),

    #[error(transparent)]
    Model(#[from] ModelError),
}

/// A specialized `Result` type for evaluation operations.
pub type SegEvalResult<T> = Result<T, SegEvalError>;
