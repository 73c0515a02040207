//! Precision-recall and ROC curves over every distinct score.
//!
//! Both curves are built from the same cumulative counts: scores are sorted
//! in decreasing order, ties are collapsed, and for each distinct score `s`
//! the number of true and false positives among samples with score `>= s`
//! is recorded.

use crate::error::{MetricError, MetricResult};

/// Cumulative counts at each distinct score, thresholds decreasing.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ClassificationCounts {
    pub false_positives: Vec<f64>,
    pub true_positives: Vec<f64>,
    pub thresholds: Vec<f32>,
}

pub(crate) fn binary_clf_curve(
    labels: &[u8],
    scores: &[f32],
    metric: &'static str,
) -> MetricResult<ClassificationCounts> {
    if labels.len() != scores.len() {
        return Err(MetricError::LengthMismatch {
            labels: labels.len(),
            values: scores.len(),
        });
    }
    if labels.is_empty() {
        return Err(MetricError::EmptyInput { metric });
    }

    let mut samples: Vec<(f32, bool)> = scores
        .iter()
        .zip(labels)
        .map(|(&score, &label)| (score, label > 0))
        .collect();
    samples.sort_unstable_by(|a, b| b.0.total_cmp(&a.0));

    let mut counts = ClassificationCounts {
        false_positives: Vec::new(),
        true_positives: Vec::new(),
        thresholds: Vec::new(),
    };
    let (mut tp, mut fp) = (0.0f64, 0.0f64);
    for (i, &(score, positive)) in samples.iter().enumerate() {
        if positive {
            tp += 1.0;
        } else {
            fp += 1.0;
        }
        let last_of_run = samples.get(i + 1).is_none_or(|next| next.0 != score);
        if last_of_run {
            counts.true_positives.push(tp);
            counts.false_positives.push(fp);
            counts.thresholds.push(score);
        }
    }

    Ok(counts)
}

/// Precision and recall at every distinct threshold.
///
/// `thresholds` is increasing. `precision` and `recall` hold one extra final
/// point `(precision = 1, recall = 0)` that has no threshold, so recall is
/// non-increasing along the curve.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecisionRecallCurve {
    pub precision: Vec<f64>,
    pub recall: Vec<f64>,
    pub thresholds: Vec<f32>,
}

impl PrecisionRecallCurve {
    /// Number of points that carry a threshold.
    pub fn len(&self) -> usize {
        self.thresholds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.thresholds.is_empty()
    }

    /// `(recall, precision)` pairs in curve order, for plotting.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.recall
            .iter()
            .copied()
            .zip(self.precision.iter().copied())
            .collect()
    }
}

/// Compute the precision-recall curve.
///
/// When the labels contain no positive sample, recall is defined as 1 at every
/// threshold.
pub fn precision_recall_curve(
    labels: &[u8],
    scores: &[f32],
) -> MetricResult<PrecisionRecallCurve> {
    let counts = binary_clf_curve(labels, scores, "precision-recall curve")?;
    let total_positives = counts.true_positives.last().copied().unwrap_or(0.0);
    if total_positives == 0.0 {
        tracing::warn!("no positive samples in labels; recall is set to 1 for all thresholds");
    }

    let n = counts.thresholds.len();
    let mut precision = Vec::with_capacity(n + 1);
    let mut recall = Vec::with_capacity(n + 1);
    for (&tp, &fp) in counts
        .true_positives
        .iter()
        .zip(&counts.false_positives)
        .rev()
    {
        let predicted = tp + fp;
        precision.push(if predicted > 0.0 { tp / predicted } else { 0.0 });
        recall.push(if total_positives > 0.0 {
            tp / total_positives
        } else {
            1.0
        });
    }
    precision.push(1.0);
    recall.push(0.0);

    let mut thresholds = counts.thresholds;
    thresholds.reverse();

    Ok(PrecisionRecallCurve {
        precision,
        recall,
        thresholds,
    })
}

/// Receiver operating characteristic curve.
///
/// Starts at `(0, 0)` with threshold `+inf`; thresholds decrease along the
/// curve. Collinear intermediate points are dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct RocCurve {
    pub false_positive_rate: Vec<f64>,
    pub true_positive_rate: Vec<f64>,
    pub thresholds: Vec<f32>,
}

impl RocCurve {
    /// `(fpr, tpr)` pairs in curve order, for plotting.
    pub fn points(&self) -> Vec<(f64, f64)> {
        self.false_positive_rate
            .iter()
            .copied()
            .zip(self.true_positive_rate.iter().copied())
            .collect()
    }

    /// Area under the curve.
    pub fn auc(&self) -> MetricResult<f64> {
        auc(&self.false_positive_rate, &self.true_positive_rate)
    }
}

/// Compute the ROC curve.
///
/// Fails with [`MetricError::SingleClass`] when the labels lack either
/// positives or negatives, since one of the rates is then undefined.
pub fn roc_curve(labels: &[u8], scores: &[f32]) -> MetricResult<RocCurve> {
    let counts = binary_clf_curve(labels, scores, "ROC curve")?;
    let (fps, tps, thresholds) = drop_intermediate(counts);

    let total_negatives = fps.last().copied().unwrap_or(0.0);
    let total_positives = tps.last().copied().unwrap_or(0.0);
    if total_negatives <= 0.0 {
        return Err(MetricError::SingleClass {
            metric: "ROC curve",
            missing: "negative",
        });
    }
    if total_positives <= 0.0 {
        return Err(MetricError::SingleClass {
            metric: "ROC curve",
            missing: "positive",
        });
    }

    let false_positive_rate = std::iter::once(0.0)
        .chain(fps.iter().map(|&fp| fp / total_negatives))
        .collect();
    let true_positive_rate = std::iter::once(0.0)
        .chain(tps.iter().map(|&tp| tp / total_positives))
        .collect();
    let thresholds = std::iter::once(f32::INFINITY).chain(thresholds).collect();

    Ok(RocCurve {
        false_positive_rate,
        true_positive_rate,
        thresholds,
    })
}

/// Keep the end points and every point where the curve changes slope.
fn drop_intermediate(counts: ClassificationCounts) -> (Vec<f64>, Vec<f64>, Vec<f32>) {
    let ClassificationCounts {
        false_positives: fps,
        true_positives: tps,
        thresholds,
    } = counts;
    let n = thresholds.len();
    if n <= 2 {
        return (fps, tps, thresholds);
    }

    let keep = |i: usize| {
        i == 0
            || i == n - 1
            || fps[i + 1] - 2.0 * fps[i] + fps[i - 1] != 0.0
            || tps[i + 1] - 2.0 * tps[i] + tps[i - 1] != 0.0
    };
    let kept: Vec<usize> = (0..n).filter(|&i| keep(i)).collect();

    (
        kept.iter().map(|&i| fps[i]).collect(),
        kept.iter().map(|&i| tps[i]).collect(),
        kept.iter().map(|&i| thresholds[i]).collect(),
    )
}

/// Area under a curve by the trapezoidal rule.
///
/// `x` must be monotonic, either increasing or decreasing; the area is
/// reported as positive in both cases.
pub fn auc(x: &[f64], y: &[f64]) -> MetricResult<f64> {
    if x.len() != y.len() {
        return Err(MetricError::LengthMismatch {
            labels: x.len(),
            values: y.len(),
        });
    }
    if x.len() < 2 {
        return Err(MetricError::EmptyInput { metric: "AUC" });
    }

    let increasing = x.windows(2).all(|w| w[1] >= w[0]);
    let decreasing = x.windows(2).all(|w| w[1] <= w[0]);
    let direction = match (increasing, decreasing) {
        (true, _) => 1.0,
        (false, true) => -1.0,
        (false, false) => return Err(MetricError::NonMonotonic),
    };

    let area: f64 = x
        .windows(2)
        .zip(y.windows(2))
        .map(|(xs, ys)| (xs[1] - xs[0]) * (ys[1] + ys[0]) / 2.0)
        .sum();
    Ok(direction * area)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rstest::*;

    use super::*;

    const LABELS: [u8; 4] = [0, 0, 1, 1];
    const SCORES: [f32; 4] = [0.1, 0.4, 0.35, 0.8];

    #[test]
    fn counts_collapse_tied_scores() {
        let counts = binary_clf_curve(&[1, 0, 1, 0], &[0.5, 0.5, 0.9, 0.1], "test").unwrap();
        assert_eq!(counts.thresholds, vec![0.9, 0.5, 0.1]);
        assert_eq!(counts.true_positives, vec![1.0, 2.0, 2.0]);
        assert_eq!(counts.false_positives, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn precision_recall_curve_matches_reference_values() {
        let curve = precision_recall_curve(&LABELS, &SCORES).unwrap();
        assert_eq!(curve.thresholds, vec![0.1, 0.35, 0.4, 0.8]);

        let expected_precision = [0.5, 2.0 / 3.0, 0.5, 1.0, 1.0];
        let expected_recall = [1.0, 1.0, 0.5, 0.5, 0.0];
        for (actual, expected) in curve.precision.iter().zip(expected_precision) {
            assert_relative_eq!(*actual, expected, epsilon = 1e-12);
        }
        for (actual, expected) in curve.recall.iter().zip(expected_recall) {
            assert_relative_eq!(*actual, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn recall_is_one_without_positives() {
        let curve = precision_recall_curve(&[0, 0, 0], &[0.2, 0.7, 0.7]).unwrap();
        assert_eq!(curve.recall, vec![1.0, 1.0, 0.0]);
        assert_eq!(curve.precision, vec![0.0, 0.0, 1.0]);
    }

    #[test]
    fn roc_curve_matches_reference_values() {
        let roc = roc_curve(&LABELS, &SCORES).unwrap();
        assert_eq!(roc.false_positive_rate, vec![0.0, 0.0, 0.5, 0.5, 1.0]);
        assert_eq!(roc.true_positive_rate, vec![0.0, 0.5, 0.5, 1.0, 1.0]);
        assert!(roc.thresholds[0].is_infinite());
        assert_eq!(&roc.thresholds[1..], &[0.8, 0.4, 0.35, 0.1]);
        assert_relative_eq!(roc.auc().unwrap(), 0.75);
    }

    #[test]
    fn roc_drops_collinear_points() {
        // Four negatives in a row below every positive: the middle ones lie on one line.
        let labels = [1u8, 1, 0, 0, 0, 0];
        let scores = [0.9f32, 0.8, 0.4, 0.3, 0.2, 0.1];
        let roc = roc_curve(&labels, &scores).unwrap();
        assert_eq!(roc.false_positive_rate, vec![0.0, 0.0, 0.0, 1.0]);
        assert_eq!(roc.true_positive_rate, vec![0.0, 0.5, 1.0, 1.0]);
        assert_relative_eq!(roc.auc().unwrap(), 1.0);
    }

    #[rstest]
    #[case(&[1, 1], "negative")]
    #[case(&[0, 0], "positive")]
    fn roc_requires_both_classes(#[case] labels: &[u8], #[case] missing: &'static str) {
        assert_eq!(
            roc_curve(labels, &[0.3, 0.6]),
            Err(MetricError::SingleClass {
                metric: "ROC curve",
                missing,
            })
        );
    }

    #[rstest]
    #[case(&[0.0, 0.5, 1.0], &[0.0, 1.0, 1.0], 0.75)]
    #[case(&[1.0, 0.5, 0.0], &[1.0, 1.0, 0.0], 0.75)]
    #[case(&[0.0, 1.0], &[1.0, 1.0], 1.0)]
    fn auc_integrates_trapezoids(#[case] x: &[f64], #[case] y: &[f64], #[case] expected: f64) {
        assert_relative_eq!(auc(x, y).unwrap(), expected);
    }

    #[test]
    fn auc_rejects_unsorted_x() {
        assert_eq!(
            auc(&[0.0, 1.0, 0.5], &[0.0, 1.0, 1.0]),
            Err(MetricError::NonMonotonic)
        );
    }

    #[test]
    fn curves_reject_bad_input() {
        assert_eq!(
            precision_recall_curve(&[], &[]),
            Err(MetricError::EmptyInput {
                metric: "precision-recall curve"
            })
        );
        assert_eq!(
            precision_recall_curve(&[1], &[0.5, 0.2]),
            Err(MetricError::LengthMismatch {
                labels: 1,
                values: 2
            })
        );
    }
}
