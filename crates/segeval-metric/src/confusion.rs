//! Pixel-level confusion matrix and the metrics derived from it.

use serde::{Deserialize, Serialize};

use crate::error::{MetricError, MetricResult};

/// Default smoothing term for Dice and F1.
pub const DEFAULT_EPSILON: f64 = 1e-6;

/// Binary confusion matrix over a flattened batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positives: u64,
    pub false_positives: u64,
    pub false_negatives: u64,
    pub true_negatives: u64,
}

/// Rates derived from a confusion matrix.
///
/// Each value is `None` when its denominator is zero, e.g. sensitivity on a
/// batch with no positive pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ClinicalMetrics {
    /// `TP / (TP + FN)`, the true-positive rate (recall).
    pub sensitivity: Option<f64>,
    /// `TN / (TN + FP)`, the true-negative rate.
    pub specificity: Option<f64>,
    /// `TP / (TP + FP)`.
    pub precision: Option<f64>,
}

impl ConfusionMatrix {
    /// Count outcomes for paired ground-truth and predicted labels.
    ///
    /// Any non-zero value counts as positive.
    pub fn from_labels(truth: &[u8], predicted: &[u8]) -> MetricResult<Self> {
        if truth.len() != predicted.len() {
            return Err(MetricError::LengthMismatch {
                labels: truth.len(),
                values: predicted.len(),
            });
        }

        let mut matrix = Self::default();
        for (&t, &p) in truth.iter().zip(predicted) {
            match (t > 0, p > 0) {
                (true, true) => matrix.true_positives += 1,
                (false, true) => matrix.false_positives += 1,
                (true, false) => matrix.false_negatives += 1,
                (false, false) => matrix.true_negatives += 1,
            }
        }
        Ok(matrix)
    }

    /// Total number of samples counted.
    pub const fn total(&self) -> u64 {
        self.true_positives + self.false_positives + self.false_negatives + self.true_negatives
    }

    /// Number of ground-truth positives (`|T|`).
    pub const fn actual_positives(&self) -> u64 {
        self.true_positives + self.false_negatives
    }

    /// Number of predicted positives (`|P|`).
    pub const fn predicted_positives(&self) -> u64 {
        self.true_positives + self.false_positives
    }

    /// Dice coefficient `2|T ∩ P| / (|T| + |P| + epsilon)`.
    pub fn dice(&self, epsilon: f64) -> f64 {
        let intersection = self.true_positives as f64;
        let areas = (self.actual_positives() + self.predicted_positives()) as f64;
        2.0 * intersection / (areas + epsilon)
    }

    /// Jaccard index `|T ∩ P| / |T ∪ P|`, 0 when both sets are empty.
    pub fn iou(&self) -> f64 {
        let union = self.true_positives + self.false_positives + self.false_negatives;
        if union == 0 {
            0.0
        } else {
            self.true_positives as f64 / union as f64
        }
    }

    pub fn sensitivity(&self) -> Option<f64> {
        ratio(self.true_positives, self.actual_positives())
    }

    pub fn specificity(&self) -> Option<f64> {
        ratio(self.true_negatives, self.true_negatives + self.false_positives)
    }

    pub fn precision(&self) -> Option<f64> {
        ratio(self.true_positives, self.predicted_positives())
    }

    pub fn clinical(&self) -> ClinicalMetrics {
        ClinicalMetrics {
            sensitivity: self.sensitivity(),
            specificity: self.specificity(),
            precision: self.precision(),
        }
    }
}

/// Dice coefficient over paired flattened labels.
pub fn dice_score(truth: &[u8], predicted: &[u8], epsilon: f64) -> MetricResult<f64> {
    Ok(ConfusionMatrix::from_labels(truth, predicted)?.dice(epsilon))
}

/// Jaccard index over paired flattened labels.
pub fn iou_score(truth: &[u8], predicted: &[u8]) -> MetricResult<f64> {
    Ok(ConfusionMatrix::from_labels(truth, predicted)?.iou())
}

fn ratio(numerator: u64, denominator: u64) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}
