//! The evaluation pipeline.
//!
//! [`evaluate`] is pure: it takes an in-memory dataset and a model and returns
//! the report together with the intermediate batches. [`run_evaluation`] wires
//! it to files, the Burn U-Net, the console and the figure writer.

use std::fs;

use anyhow::{Context, Result};
use burn::tensor::backend::Backend;
use segeval_inference::{binarize, postprocess_batch};
use segeval_metric::{
    MetricError, PrecisionRecallCurve, RocCurve, auc, precision_recall_curve, roc_curve,
};
use segeval_model::{SegmentationModel, UNetPredictor, load_unet};

use crate::{
    config::{EvaluationConfig, EvaluationPaths},
    dataset::{Dataset, MaskBatch, ProbabilityBatch, load_dataset},
    error::{SegEvalError, SegEvalResult},
    figures,
    report::{EvaluationReport, MetricSet},
};

/// Threshold sweeps over the raw probabilities.
#[derive(Debug, Clone)]
pub struct Curves {
    pub precision_recall: PrecisionRecallCurve,
    /// `None` when the ground truth holds a single class.
    pub roc: Option<RocCurve>,
}

/// Everything an evaluation produces.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub report: EvaluationReport,
    pub curves: Curves,
    pub probabilities: ProbabilityBatch,
    /// Probabilities binarised at the selected threshold.
    pub predictions: MaskBatch,
    /// `predictions` after closing and small-component removal.
    pub postprocessed: MaskBatch,
}

/// Evaluate `model` on `dataset`.
///
/// Runs inference once, selects the F1-optimal threshold on the pixel-level
/// precision-recall curve, binarises, post-processes and scores both the raw
/// and post-processed predictions.
///
/// # Errors
///
/// Fails when the model output does not match the mask shape or leaves
/// `[0, 1]`, or when any stage rejects its input.
pub fn evaluate<M>(
    dataset: &Dataset,
    model: &M,
    config: &EvaluationConfig,
) -> SegEvalResult<Evaluation>
where
    M: SegmentationModel + ?Sized,
{
    let output = model.predict(dataset.images().view())?;
    let (n, h, w) = dataset.masks().dim();
    if output.dim() != (n, h, w) {
        return Err(SegEvalError::ShapeMismatch {
            left_name: "masks",
            left: vec![n, h, w],
            right_name: "predictions",
            right: output.shape().to_vec(),
        });
    }
    let probabilities = ProbabilityBatch::new(output)?;
    tracing::info!(images = n, height = h, width = w, "inference finished");

    let labels = dataset.masks().as_flat();
    let scores = probabilities.as_flat();

    let precision_recall = precision_recall_curve(&labels, &scores)?;
    let threshold = config.threshold().select(&precision_recall)?;
    tracing::info!(
        threshold = threshold.threshold,
        f1 = threshold.f1,
        "selected threshold"
    );

    let predictions = MaskBatch::new(binarize(probabilities.view(), threshold.threshold))?;
    let postprocessed = MaskBatch::new(postprocess_batch(
        predictions.view(),
        &config.postprocess,
    )?)?;

    let raw = MetricSet::compute(&labels, &predictions.as_flat(), config.epsilon)?;
    let post = MetricSet::compute(&labels, &postprocessed.as_flat(), config.epsilon)?;

    let roc = match roc_curve(&labels, &scores) {
        Ok(curve) => Some(curve),
        Err(MetricError::SingleClass { missing, .. }) => {
            tracing::warn!(missing, "ground truth has a single class; ROC curve is undefined");
            None
        }
        Err(e) => return Err(e.into()),
    };
    let roc_auc = roc.as_ref().map(RocCurve::auc).transpose()?;
    let pr_auc = auc(&precision_recall.recall, &precision_recall.precision).ok();

    let report = EvaluationReport {
        images: n,
        threshold,
        raw,
        postprocessed: post,
        roc_auc,
        pr_auc,
    };

    Ok(Evaluation {
        report,
        curves: Curves {
            precision_recall,
            roc,
        },
        probabilities,
        predictions,
        postprocessed,
    })
}

/// Load the test set and model from `paths`, evaluate, print the report and
/// write figures (plus the JSON report when requested).
///
/// # Errors
///
/// Returns an error if an input file cannot be read, the model weights do
/// not match `config.model`, evaluation fails or an output cannot be written.
pub fn run_evaluation<B: Backend>(
    paths: &EvaluationPaths,
    config: &EvaluationConfig,
    device: &B::Device,
) -> Result<EvaluationReport> {
    tracing::info!(
        data = %paths.data_dir.display(),
        model = %paths.model_path.display(),
        output = %paths.output_dir.display(),
        "running evaluation",
    );

    let dataset = load_dataset(
        &paths.images_path(),
        &paths.masks_path(),
        config.mask_threshold,
    )
    .context("failed to load the test set")?;

    let model = load_unet::<B>(&paths.model_path, &config.model, device)
        .with_context(|| format!("failed to load model {}", paths.model_path.display()))?;
    let predictor = UNetPredictor::new(model, &config.model, device.clone())
        .with_batch_size(config.batch_size);
    tracing::info!("model loaded successfully");

    let evaluation = evaluate(&dataset, &predictor, config)?;
    println!("{}", evaluation.report);

    fs::create_dir_all(&paths.output_dir).with_context(|| {
        format!(
            "failed to create output directory {}",
            paths.output_dir.display()
        )
    })?;
    let samples = figures::write_figures(
        &paths.output_dir,
        &dataset,
        &evaluation,
        config.num_samples,
        config.seed,
    )?;
    for index in samples {
        println!(
            "Saved visualization for sample {index} as {}",
            figures::visualization_file_name(index)
        );
    }

    if let Some(report_path) = &paths.report_path {
        evaluation.report.save_json(report_path)?;
        tracing::info!(path = %report_path.display(), "saved report");
    }

    tracing::info!("evaluation completed");
    Ok(evaluation.report)
}
