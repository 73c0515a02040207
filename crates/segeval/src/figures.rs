//! Diagnostic figures written after an evaluation.
//!
//! - `performance_curves.png`: ROC (with the dashed chance diagonal) and
//!   precision-recall panels side by side.
//! - `visualization_{i}.png`: image, ground truth, probability map,
//!   thresholded and post-processed masks for randomly drawn samples.
//! - `comparison.png`: image, ground truth and post-processed mask of sample 0.

use std::path::Path;

use image::RgbImage;
use ndarray::Axis;
use rand::{SeedableRng, rngs::StdRng, seq::index};
use segeval_util::{
    image::{compose_horizontal, image_to_rgb, mask_to_rgb, probability_to_rgb, upscale_nearest},
    plot::{BLUE, DARK_ORANGE, LinePlot, NAVY, Series},
};

use crate::{
    dataset::Dataset,
    error::{SegEvalError, SegEvalResult},
    evaluation::{Curves, Evaluation},
};

pub const PERFORMANCE_CURVES_FILE: &str = "performance_curves.png";
pub const COMPARISON_FILE: &str = "comparison.png";

const CURVE_PANEL_SIZE: u32 = 600;
const PANEL_GAP: u32 = 16;
/// Small masks are upscaled until their longer side reaches this many pixels.
const MIN_PANEL_SIDE: u32 = 256;

pub fn visualization_file_name(index: usize) -> String {
    format!("visualization_{index}.png")
}

/// Draw `count` distinct indices from `0..len`, clamped to `len`.
pub fn sample_indices(len: usize, count: usize, seed: Option<u64>) -> Vec<usize> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    index::sample(&mut rng, len, count.min(len)).into_vec()
}

/// ROC and precision-recall panels side by side.
///
/// The ROC panel keeps only the chance diagonal when the curve is undefined.
pub fn render_performance_curves(curves: &Curves) -> RgbImage {
    let mut roc = LinePlot::new(CURVE_PANEL_SIZE, CURVE_PANEL_SIZE);
    if let Some(curve) = &curves.roc {
        roc = roc.with_series(Series::solid(curve.points(), DARK_ORANGE));
    }
    let roc = roc
        .with_series(Series::dashed(vec![(0.0, 0.0), (1.0, 1.0)], NAVY))
        .render();

    let pr = LinePlot::new(CURVE_PANEL_SIZE, CURVE_PANEL_SIZE)
        .with_series(Series::solid(curves.precision_recall.points(), BLUE))
        .render();

    compose_horizontal(&[roc, pr], PANEL_GAP)
}

/// Five panels for one sample: image, ground truth, probabilities,
/// thresholded prediction and post-processed prediction.
pub fn render_visualization(
    dataset: &Dataset,
    evaluation: &Evaluation,
    index: usize,
) -> SegEvalResult<RgbImage> {
    let panels = [
        image_to_rgb(dataset.images().view().index_axis(Axis(0), index))?,
        mask_to_rgb(dataset.masks().view().index_axis(Axis(0), index)),
        probability_to_rgb(evaluation.probabilities.view().index_axis(Axis(0), index)),
        mask_to_rgb(evaluation.predictions.view().index_axis(Axis(0), index)),
        mask_to_rgb(evaluation.postprocessed.view().index_axis(Axis(0), index)),
    ];
    Ok(compose_panels(&panels))
}

/// Image, ground truth and post-processed prediction of sample 0.
pub fn render_comparison(dataset: &Dataset, evaluation: &Evaluation) -> SegEvalResult<RgbImage> {
    let panels = [
        image_to_rgb(dataset.images().view().index_axis(Axis(0), 0))?,
        mask_to_rgb(dataset.masks().view().index_axis(Axis(0), 0)),
        mask_to_rgb(evaluation.postprocessed.view().index_axis(Axis(0), 0)),
    ];
    Ok(compose_panels(&panels))
}

/// Write every figure into `output_dir`, returning the visualised sample indices.
pub fn write_figures(
    output_dir: &Path,
    dataset: &Dataset,
    evaluation: &Evaluation,
    num_samples: usize,
    seed: Option<u64>,
) -> SegEvalResult<Vec<usize>> {
    save(
        &render_performance_curves(&evaluation.curves),
        &output_dir.join(PERFORMANCE_CURVES_FILE),
    )?;

    let samples = sample_indices(dataset.len(), num_samples, seed);
    for &index in &samples {
        let figure = render_visualization(dataset, evaluation, index)?;
        save(&figure, &output_dir.join(visualization_file_name(index)))?;
    }

    save(
        &render_comparison(dataset, evaluation)?,
        &output_dir.join(COMPARISON_FILE),
    )?;

    tracing::info!(
        output = %output_dir.display(),
        samples = samples.len(),
        "figures written"
    );
    Ok(samples)
}

fn compose_panels(panels: &[RgbImage]) -> RgbImage {
    let side = panels
        .iter()
        .map(|panel| panel.width().max(panel.height()))
        .max()
        .unwrap_or(1)
        .max(1);
    let factor = MIN_PANEL_SIDE.div_ceil(side).max(1);
    let scaled: Vec<RgbImage> = panels
        .iter()
        .map(|panel| upscale_nearest(panel, factor))
        .collect();
    compose_horizontal(&scaled, PANEL_GAP)
}

fn save(image: &RgbImage, path: &Path) -> SegEvalResult<()> {
    image.save(path).map_err(|e| SegEvalError::Output {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    tracing::debug!(path = %path.display(), "saved figure");
    Ok(())
}
