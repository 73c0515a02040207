//! Binarization and morphological clean-up of predicted masks.
//!
//! Probabilities become hard labels with a strict `p > threshold` test. Each
//! binary mask is then closed with a square structuring element and stripped
//! of connected components smaller than a minimum size.

use burn::config::Config;
use ndarray::{Array2, Array3, ArrayView2, ArrayView3, Axis};
use rayon::prelude::*;
use segeval_util::{
    Connectivity, StructuringElement, UtilResult, closing, remove_small_components,
};

/// Apply a threshold to create a binary mask.
///
/// A pixel is foreground only when its probability is strictly greater than
/// `threshold`.
pub fn binarize(probabilities: ArrayView3<'_, f32>, threshold: f32) -> Array3<u8> {
    probabilities.mapv(|p| u8::from(p > threshold))
}

/// Settings for [`postprocess_mask`].
#[derive(Config, Debug, PartialEq, Eq)]
pub struct PostprocessConfig {
    /// Side of the square closing element. Must be odd; 1 disables closing.
    #[config(default = "3")]
    pub kernel_size: usize,
    /// Components with fewer pixels than this are removed.
    #[config(default = "100")]
    pub min_component_size: usize,
    /// Adjacency used for component labelling.
    #[config(default = "Connectivity::Eight")]
    pub connectivity: Connectivity,
}

impl PostprocessConfig {
    /// The structuring element described by `kernel_size`.
    pub fn element(&self) -> UtilResult<StructuringElement> {
        StructuringElement::square(self.kernel_size)
    }
}

/// Clean up a single binary mask.
///
/// 1. Morphological closing with a `kernel_size`² square element.
/// 2. Connected components with fewer than `min_component_size` pixels are zeroed.
///
/// The output is a `{0, 1}` mask of the same shape. A mask with no
/// foreground after closing comes back all zeros.
pub fn postprocess_mask(
    mask: ArrayView2<'_, u8>,
    config: &PostprocessConfig,
) -> UtilResult<Array2<u8>> {
    let element = config.element()?;
    Ok(clean(mask, &element, config))
}

/// Post-process every mask of a `[N, H, W]` batch.
///
/// Images are processed independently and in parallel; the result is the
/// same as applying [`postprocess_mask`] to each image in order.
pub fn postprocess_batch(
    masks: ArrayView3<'_, u8>,
    config: &PostprocessConfig,
) -> UtilResult<Array3<u8>> {
    let element = config.element()?;
    let (count, height, width) = masks.dim();
    if count == 0 {
        return Ok(Array3::zeros((0, height, width)));
    }

    let cleaned: Vec<Array2<u8>> = (0..count)
        .into_par_iter()
        .map(|index| clean(masks.index_axis(Axis(0), index), &element, config))
        .collect();
    tracing::debug!(
        images = count,
        kernel_size = config.kernel_size,
        min_component_size = config.min_component_size,
        "post-processed masks"
    );

    let mut output = Array3::zeros((count, height, width));
    for (mut slot, mask) in output.outer_iter_mut().zip(&cleaned) {
        slot.assign(mask);
    }
    Ok(output)
}

fn clean(
    mask: ArrayView2<'_, u8>,
    element: &StructuringElement,
    config: &PostprocessConfig,
) -> Array2<u8> {
    let closed = closing(mask, element);
    remove_small_components(closed.view(), config.min_component_size, config.connectivity)
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, Array3, array, s};
    use rstest::*;

    use super::*;
    use segeval_util::UtilError;

    fn square_mask(size: usize, blobs: &[(usize, usize, usize, usize)]) -> Array2<u8> {
        let mut mask = Array2::zeros((size, size));
        for &(y, x, h, w) in blobs {
            mask.slice_mut(s![y..y + h, x..x + w]).fill(1);
        }
        mask
    }

    #[test]
    fn threshold_is_strict() {
        let probabilities = array![[[0.2f32, 0.5, 0.50001, 0.9]]];
        assert_eq!(binarize(probabilities.view(), 0.5), array![[[0u8, 0, 1, 1]]]);
    }

    #[rstest]
    #[case(0.1, 0.3)]
    #[case(0.3, 0.7)]
    #[case(0.0, 1.0)]
    fn raising_the_threshold_never_adds_foreground(#[case] low: f32, #[case] high: f32) {
        let probabilities =
            Array3::from_shape_fn((2, 5, 5), |(n, y, x)| ((n + y * 5 + x) % 10) as f32 / 10.0);
        let loose = binarize(probabilities.view(), low);
        let strict = binarize(probabilities.view(), high);
        assert!(loose.iter().zip(strict.iter()).all(|(&l, &s)| s <= l));
    }

    #[test]
    fn default_config_matches_documented_values() {
        let config = PostprocessConfig::new();
        assert_eq!(config.kernel_size, 3);
        assert_eq!(config.min_component_size, 100);
        assert_eq!(config.connectivity, Connectivity::Eight);
    }

    #[rstest]
    #[case(99, 0)]
    #[case(100, 100)]
    fn components_below_minimum_are_removed(#[case] pixels: usize, #[case] expected: usize) {
        // a 1-pixel-wide line survives a 3×3 closing unchanged
        let mut mask = Array2::<u8>::zeros((120, 120));
        mask.slice_mut(s![10, 10..10 + pixels]).fill(1);

        let cleaned = postprocess_mask(mask.view(), &PostprocessConfig::new()).unwrap();
        assert_eq!(cleaned.iter().filter(|&&v| v == 1).count(), expected);
    }

    #[test]
    fn closing_fills_single_pixel_holes_before_filtering() {
        let mut mask = square_mask(32, &[(4, 4, 12, 12)]);
        mask[[9, 9]] = 0;

        let cleaned = postprocess_mask(mask.view(), &PostprocessConfig::new()).unwrap();
        assert_eq!(cleaned[[9, 9]], 1);
        assert_eq!(cleaned.iter().filter(|&&v| v == 1).count(), 144);
    }

    #[test]
    fn empty_mask_stays_empty() {
        let mask = Array2::<u8>::zeros((16, 16));
        let cleaned = postprocess_mask(mask.view(), &PostprocessConfig::new()).unwrap();
        assert!(cleaned.iter().all(|&v| v == 0));
    }

    #[test]
    fn output_is_idempotent() {
        let mask = square_mask(48, &[(2, 2, 20, 20), (30, 30, 3, 3), (25, 5, 12, 10)]);
        let config = PostprocessConfig::new();
        let once = postprocess_mask(mask.view(), &config).unwrap();
        let twice = postprocess_mask(once.view(), &config).unwrap();
        assert_eq!(once, twice);
        assert!(once.iter().all(|&v| v <= 1));
    }

    #[rstest]
    #[case(2)]
    #[case(0)]
    fn even_kernel_sizes_are_rejected(#[case] kernel_size: usize) {
        let config = PostprocessConfig::new().with_kernel_size(kernel_size);
        let mask = Array2::<u8>::zeros((4, 4));
        assert!(matches!(
            postprocess_mask(mask.view(), &config),
            Err(UtilError::InvalidKernelSize { .. })
        ));
    }

    #[test]
    fn batch_matches_per_image_processing() {
        let masks = Array3::from_shape_fn((6, 40, 40), |(n, y, x)| {
            u8::from((y * 7 + x * 3 + n * 11) % 13 < 6 || (y > 10 && y < 30 && x > 5 + n))
        });
        let config = PostprocessConfig::new().with_min_component_size(20);

        let batched = postprocess_batch(masks.view(), &config).unwrap();
        for (index, mask) in masks.outer_iter().enumerate() {
            let single = postprocess_mask(mask, &config).unwrap();
            assert_eq!(batched.index_axis(Axis(0), index), single);
        }
    }

    #[test]
    fn empty_batch_keeps_spatial_shape() {
        let masks = Array3::<u8>::zeros((0, 8, 8));
        let cleaned = postprocess_batch(masks.view(), &PostprocessConfig::new()).unwrap();
        assert_eq!(cleaned.dim(), (0, 8, 8));
    }
}
