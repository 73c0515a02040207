use thiserror::Error;

/// Errors raised while computing metrics.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetricError {
    /// No samples were provided.
    #[error("cannot compute {metric} on empty input")]
    EmptyInput { metric: &'static str },

    /// Label and score/prediction buffers differ in length.
    #[error("length mismatch: {labels} labels vs {values} values")]
    LengthMismatch { labels: usize, values: usize },

    /// The curve is undefined because one class never occurs.
    #[error("{metric} is undefined: no {missing} samples in the labels")]
    SingleClass {
        metric: &'static str,
        missing: &'static str,
    },

    /// AUC needs the x coordinates sorted in one direction.
    #[error("x coordinates are neither increasing nor decreasing")]
    NonMonotonic,
}

pub type MetricResult<T> = Result<T, MetricError>;
