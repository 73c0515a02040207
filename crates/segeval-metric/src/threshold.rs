//! Decision threshold selection on a precision-recall curve.

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::{
    curve::PrecisionRecallCurve,
    error::{MetricError, MetricResult},
};

/// Configuration for F1-maximising threshold selection.
#[derive(Config, Debug)]
pub struct F1ThresholdConfig {
    /// Added to `precision + recall` so F1 is 0 rather than NaN when both are 0.
    #[config(default = 1e-6)]
    pub epsilon: f64,
}

/// The chosen cut-off and the score it achieved.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdSelection {
    /// Probability cut-off; predictions are positive when strictly greater.
    pub threshold: f32,
    /// F1 at this threshold.
    pub f1: f64,
    /// Index of the threshold in the curve's (increasing) threshold list.
    pub index: usize,
}

impl F1ThresholdConfig {
    /// F1 with the configured smoothing term.
    pub fn f1(&self, precision: f64, recall: f64) -> f64 {
        2.0 * precision * recall / (precision + recall + self.epsilon)
    }

    /// Select the threshold with the highest F1.
    ///
    /// Only curve points that carry a threshold are considered. Ties resolve
    /// to the lowest threshold, i.e. the first maximum along the curve.
    pub fn select(&self, curve: &PrecisionRecallCurve) -> MetricResult<ThresholdSelection> {
        let mut best: Option<ThresholdSelection> = None;
        for (index, &threshold) in curve.thresholds.iter().enumerate() {
            let f1 = self.f1(curve.precision[index], curve.recall[index]);
            if best.is_none_or(|b| f1 > b.f1) {
                best = Some(ThresholdSelection {
                    threshold,
                    f1,
                    index,
                });
            }
        }

        let selection = best.ok_or(MetricError::EmptyInput {
            metric: "threshold selection",
        })?;
        tracing::debug!(
            threshold = selection.threshold,
            f1 = selection.f1,
            candidates = curve.len(),
            "selected F1-optimal threshold",
        );
        Ok(selection)
    }
}

/// Select the F1-optimal threshold with the given smoothing term.
pub fn select_f1_threshold(
    curve: &PrecisionRecallCurve,
    epsilon: f64,
) -> MetricResult<ThresholdSelection> {
    F1ThresholdConfig::new().with_epsilon(epsilon).select(curve)
}
