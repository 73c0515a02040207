//! # segeval metrics
//!
//! Evaluation metrics for binary segmentation, computed over flattened
//! (micro-averaged) label and score buffers.
//!
//! ## Implemented Metrics
//!
//! - [`precision_recall_curve`] / [`roc_curve`]: threshold sweeps over every
//!   distinct score, with [`auc`] for trapezoidal area.
//! - [`F1ThresholdConfig`]: picks the cut-off maximising F1 on a PR curve.
//! - [`ConfusionMatrix`]: pixel counts plus [`ClinicalMetrics`], Dice and IoU.
//!
//! Labels are `u8` with any non-zero value treated as positive. Scores are
//! `f32` probabilities.
//!
//! ## Usage
//!
//! ```rust
//! use segeval_metric::{ConfusionMatrix, F1ThresholdConfig, precision_recall_curve};
//!
//! let labels = [0u8, 0, 1, 1];
//! let scores = [0.1f32, 0.4, 0.35, 0.8];
//!
//! let curve = precision_recall_curve(&labels, &scores).unwrap();
//! let selection = F1ThresholdConfig::new().select(&curve).unwrap();
//! assert_eq!(selection.threshold, 0.35);
//!
//! let predicted: Vec<u8> = scores.iter().map(|&s| u8::from(s > 0.5)).collect();
//! let matrix = ConfusionMatrix::from_labels(&labels, &predicted).unwrap();
//! assert_eq!(matrix.total(), 4);
//! ```

pub mod confusion;
pub mod curve;
pub mod error;
pub mod threshold;

pub use confusion::{ClinicalMetrics, ConfusionMatrix, DEFAULT_EPSILON, dice_score, iou_score};
pub use curve::{PrecisionRecallCurve, RocCurve, auc, precision_recall_curve, roc_curve};
pub use error::{MetricError, MetricResult};
pub use threshold::{F1ThresholdConfig, ThresholdSelection, select_f1_threshold};
