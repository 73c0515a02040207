use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the utility routines.
#[derive(Debug, Error)]
pub enum UtilError {
    /// Structuring element size is not a usable odd square.
    #[error("invalid structuring element size {size}: expected an odd value between 1 and 511")]
    InvalidKernelSize { size: usize },

    /// Array file could not be read in any supported element type.
    #[error("failed to read array file {}: {reason}", path.display())]
    ArrayRead { path: PathBuf, reason: String },

    /// Array file could not be written.
    #[error("failed to write array file {}: {reason}", path.display())]
    ArrayWrite { path: PathBuf, reason: String },

    /// Array has a shape the caller cannot work with.
    #[error("invalid array shape: expected {expected}, got {actual:?}")]
    InvalidShape { expected: String, actual: Vec<usize> },

    /// Image buffer construction or encoding failed.
    #[error("image error: {reason}")]
    Image { reason: String },
}

pub type UtilResult<T> = Result<T, UtilError>;
