//! `segeval`: evaluation of binary image-segmentation models.
//!
//! Loads a held-out test set, runs a model once, picks the F1-optimal
//! decision threshold, post-processes the binarised masks and reports
//! overlap and clinical metrics together with ROC/PR curves and figures.
//!
//! The pipeline itself is [`evaluate`], which works on in-memory data and any
//! [`SegmentationModel`](model::SegmentationModel). [`run_evaluation`] adds file
//! loading, the Burn U-Net and figure output on top.

pub mod backend;
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod figures;
pub mod report;

#[doc(inline)]
pub use backend::burn_backend_types;
#[doc(inline)]
pub use config::{EvaluationConfig, EvaluationPaths};
#[doc(inline)]
pub use dataset::{Dataset, ImageBatch, MaskBatch, ProbabilityBatch, load_dataset};
#[doc(inline)]
pub use error::{SegEvalError, SegEvalResult};
#[doc(inline)]
pub use evaluation::{Curves, Evaluation, evaluate, run_evaluation};
#[doc(inline)]
pub use report::{EvaluationReport, MetricSet};
#[doc(inline)]
pub use segeval_inference as inference;
#[doc(inline)]
pub use segeval_metric as metric;
#[doc(inline)]
pub use segeval_model as model;
#[doc(inline)]
pub use segeval_util as util;

#[cfg(test)]
mod tests {
    use burn::backend::NdArray;

    pub type TestBackend = NdArray;
}
