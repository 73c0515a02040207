//! Scalar results of an evaluation run.

use std::{fmt, fs, path::Path};

use segeval_metric::{ClinicalMetrics, ConfusionMatrix, MetricResult, ThresholdSelection};
use serde::{Deserialize, Serialize};

use crate::error::{SegEvalError, SegEvalResult};

/// Overlap and clinical metrics of one prediction batch against the ground truth.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSet {
    pub dice: f64,
    pub iou: f64,
    pub confusion: ConfusionMatrix,
    pub clinical: ClinicalMetrics,
}

impl MetricSet {
    /// Score flattened predictions against flattened ground truth.
    pub fn compute(truth: &[u8], predicted: &[u8], epsilon: f64) -> MetricResult<Self> {
        let confusion = ConfusionMatrix::from_labels(truth, predicted)?;
        Ok(Self {
            dice: confusion.dice(epsilon),
            iou: confusion.iou(),
            confusion,
            clinical: confusion.clinical(),
        })
    }
}

/// Summary of an evaluation run, serialisable as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationReport {
    /// Number of test images.
    pub images: usize,
    /// F1-optimal threshold from the precision-recall sweep.
    pub threshold: ThresholdSelection,
    /// Metrics of the thresholded predictions.
    pub raw: MetricSet,
    /// Metrics after closing and small-component removal.
    pub postprocessed: MetricSet,
    /// Area under the ROC curve; `None` when the ground truth has a single class.
    pub roc_auc: Option<f64>,
    /// Area under the precision-recall curve.
    pub pr_auc: Option<f64>,
}

impl EvaluationReport {
    /// Write the report as pretty-printed JSON.
    pub fn save_json(&self, path: &Path) -> SegEvalResult<()> {
        let json = serde_json::to_string_pretty(self).map_err(|e| SegEvalError::Output {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        fs::write(path, json).map_err(|e| SegEvalError::Output {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

struct Undefined(Option<f64>);

impl fmt::Display for Undefined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(value) => write!(f, "{value:.4}"),
            None => f.write_str("undefined"),
        }
    }
}

impl fmt::Display for EvaluationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Optimal Threshold: {:.4}", self.threshold.threshold)?;
        writeln!(
            f,
            "Original Dice: {:.4} | Postprocessed Dice: {:.4}",
            self.raw.dice, self.postprocessed.dice
        )?;
        writeln!(
            f,
            "Original IoU: {:.4} | Postprocessed IoU: {:.4}",
            self.raw.iou, self.postprocessed.iou
        )?;
        writeln!(f)?;

        let clinical = &self.postprocessed.clinical;
        writeln!(f, "Clinical Metrics:")?;
        writeln!(f, "Sensitivity (Recall): {}", Undefined(clinical.sensitivity))?;
        writeln!(f, "Specificity: {}", Undefined(clinical.specificity))?;
        writeln!(f, "Precision: {}", Undefined(clinical.precision))?;
        write!(f, "ROC AUC: {}", Undefined(self.roc_auc))
    }
}
