//! Validated image, mask and probability batches.
//!
//! Each batch type checks its invariants once on construction and is
//! immutable afterwards, so later stages never re-validate.

use std::path::Path;

use ndarray::{Array3, Array4, ArrayD, ArrayView3, ArrayView4, Axis, Ix3, Ix4};
use segeval_util::read_array;

use crate::error::{SegEvalError, SegEvalResult};

/// Test images, laid out `[N, H, W, C]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBatch(Array4<f32>);

impl ImageBatch {
    /// Wrap an NHWC array. Fails on an empty batch or non-finite values.
    pub fn new(images: Array4<f32>) -> SegEvalResult<Self> {
        if images.len_of(Axis(0)) == 0 {
            return Err(SegEvalError::EmptyBatch { what: "image" });
        }
        if let Some(((n, y, x, c), &value)) = images.indexed_iter().find(|(_, v)| !v.is_finite()) {
            return Err(SegEvalError::NonFiniteImage {
                value,
                position: [n, y, x, c],
            });
        }
        Ok(Self(images))
    }

    /// Accept `[N, H, W]` (a channel axis is appended) or `[N, H, W, C]`.
    pub fn from_dyn(images: ArrayD<f32>) -> SegEvalResult<Self> {
        let images = match images.ndim() {
            3 => images.insert_axis(Axis(3)),
            4 => images,
            _ => {
                return Err(SegEvalError::InvalidShape {
                    what: "image",
                    expected: "[N, H, W] or [N, H, W, C]",
                    actual: images.shape().to_vec(),
                });
            }
        };
        let shape = images.shape().to_vec();
        let images = images
            .into_dimensionality::<Ix4>()
            .map_err(|_| SegEvalError::InvalidShape {
                what: "image",
                expected: "[N, H, W, C]",
                actual: shape,
            })?;
        Self::new(images)
    }

    pub fn view(&self) -> ArrayView4<'_, f32> {
        self.0.view()
    }

    pub fn len(&self) -> usize {
        self.0.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(N, H, W, C)`.
    pub fn dim(&self) -> (usize, usize, usize, usize) {
        self.0.dim()
    }
}

/// Binary masks, laid out `[N, H, W]`, every value 0 or 1.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaskBatch(Array3<u8>);

impl MaskBatch {
    /// Wrap a `[N, H, W]` array, rejecting any value other than 0 or 1.
    pub fn new(masks: Array3<u8>) -> SegEvalResult<Self> {
        if let Some(((n, y, x), &value)) = masks.indexed_iter().find(|(_, v)| **v > 1) {
            return Err(SegEvalError::NonBinaryMask {
                value,
                position: [n, y, x],
            });
        }
        Ok(Self(masks))
    }

    /// Binarise raw mask values with `value > threshold`.
    ///
    /// Accepts `[N, H, W]` or `[N, H, W, 1]`.
    pub fn from_raw(raw: ArrayD<f32>, threshold: f32) -> SegEvalResult<Self> {
        let shape = raw.shape().to_vec();
        let raw = match shape.as_slice() {
            [_, _, _] => raw,
            [_, _, _, 1] => raw.remove_axis(Axis(3)),
            _ => {
                return Err(SegEvalError::InvalidShape {
                    what: "mask",
                    expected: "[N, H, W] or [N, H, W, 1]",
                    actual: shape,
                });
            }
        };
        let raw = raw
            .into_dimensionality::<Ix3>()
            .map_err(|_| SegEvalError::InvalidShape {
                what: "mask",
                expected: "[N, H, W]",
                actual: shape,
            })?;
        Ok(Self(raw.mapv(|v| u8::from(v > threshold))))
    }

    pub fn view(&self) -> ArrayView3<'_, u8> {
        self.0.view()
    }

    pub fn len(&self) -> usize {
        self.0.len_of(Axis(0))
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(N, H, W)`.
    pub fn dim(&self) -> (usize, usize, usize) {
        self.0.dim()
    }

    /// Flattened labels in row-major order.
    pub fn as_flat(&self) -> Vec<u8> {
        self.0.iter().copied().collect()
    }

    /// Number of pixels in the batch.
    pub fn pixel_count(&self) -> usize {
        self.0.len()
    }
}

/// Per-pixel foreground probabilities, laid out `[N, H, W]`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProbabilityBatch(Array3<f32>);

impl ProbabilityBatch {
    /// Wrap model output, rejecting NaN and values outside `[0, 1]`.
    pub fn new(probabilities: Array3<f32>) -> SegEvalResult<Self> {
        if let Some(((n, y, x), &value)) = probabilities
            .indexed_iter()
            .find(|(_, p)| !(0.0..=1.0).contains(*p))
        {
            return Err(SegEvalError::ProbabilityOutOfRange {
                value,
                position: [n, y, x],
            });
        }
        Ok(Self(probabilities))
    }

    pub fn view(&self) -> ArrayView3<'_, f32> {
        self.0.view()
    }

    /// `(N, H, W)`.
    pub fn dim(&self) -> (usize, usize, usize) {
        self.0.dim()
    }

    /// Flattened scores in row-major order.
    pub fn as_flat(&self) -> Vec<f32> {
        self.0.iter().copied().collect()
    }
}

/// A test set: images with their ground-truth masks.
#[derive(Debug, Clone)]
pub struct Dataset {
    images: ImageBatch,
    masks: MaskBatch,
}

impl Dataset {
    /// Pair images with masks; both must agree on `N`, `H` and `W`.
    pub fn new(images: ImageBatch, masks: MaskBatch) -> SegEvalResult<Self> {
        let (n, h, w, _) = images.dim();
        if (n, h, w) != masks.dim() {
            let (mn, mh, mw) = masks.dim();
            return Err(SegEvalError::ShapeMismatch {
                left_name: "images",
                left: vec![n, h, w],
                right_name: "masks",
                right: vec![mn, mh, mw],
            });
        }
        Ok(Self { images, masks })
    }

    pub fn images(&self) -> &ImageBatch {
        &self.images
    }

    pub fn masks(&self) -> &MaskBatch {
        &self.masks
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

/// Load `.npy` image and mask files into a validated [`Dataset`].
///
/// Masks are binarised with `value > mask_threshold` whatever their stored dtype.
pub fn load_dataset(
    images_path: &Path,
    masks_path: &Path,
    mask_threshold: f32,
) -> SegEvalResult<Dataset> {
    let images = ImageBatch::from_dyn(read_array(images_path)?)?;
    let masks = MaskBatch::from_raw(read_array(masks_path)?, mask_threshold)?;
    tracing::info!(
        images = %images_path.display(),
        masks = %masks_path.display(),
        shape = ?images.dim(),
        "loaded test set"
    );
    Dataset::new(images, masks)
}

#[cfg(test)]
mod tests {
    use ndarray::{IxDyn, array};
    use rstest::*;
    use segeval_util::write_array;

    use super::*;

    #[test]
    fn rank_three_images_gain_a_channel_axis() {
        let raw = ArrayD::<f32>::zeros(IxDyn(&[2, 4, 6]));
        let images = ImageBatch::from_dyn(raw).unwrap();
        assert_eq!(images.dim(), (2, 4, 6, 1));
    }

    #[rstest]
    #[case(&[4, 4])]
    #[case(&[1, 2, 4, 4, 1])]
    fn images_of_other_ranks_are_rejected(#[case] shape: &[usize]) {
        let raw = ArrayD::<f32>::zeros(IxDyn(shape));
        assert!(matches!(
            ImageBatch::from_dyn(raw),
            Err(SegEvalError::InvalidShape { what: "image", .. })
        ));
    }

    #[test]
    fn empty_image_batch_is_rejected() {
        assert!(matches!(
            ImageBatch::new(Array4::zeros((0, 4, 4, 1))),
            Err(SegEvalError::EmptyBatch { .. })
        ));
    }

    #[rstest]
    #[case(f32::NAN)]
    #[case(f32::INFINITY)]
    #[case(f32::NEG_INFINITY)]
    fn non_finite_image_values_are_rejected(#[case] value: f32) {
        let mut images = Array4::<f32>::zeros((1, 2, 2, 1));
        images[[0, 1, 0, 0]] = value;
        assert!(matches!(
            ImageBatch::new(images),
            Err(SegEvalError::NonFiniteImage {
                position: [0, 1, 0, 0],
                ..
            })
        ));
    }

    #[test]
    fn raw_masks_are_binarised_strictly() {
        let raw = array![[[0.0f32, 0.5, 0.51, 255.0]]].into_dyn();
        let masks = MaskBatch::from_raw(raw, 0.5).unwrap();
        assert_eq!(masks.view(), array![[[0u8, 0, 1, 1]]]);
    }

    #[test]
    fn trailing_singleton_mask_axis_is_dropped() {
        let raw = ArrayD::<f32>::ones(IxDyn(&[2, 3, 3, 1]));
        let masks = MaskBatch::from_raw(raw, 0.5).unwrap();
        assert_eq!(masks.dim(), (2, 3, 3));
        assert_eq!(masks.pixel_count(), 18);
    }

    #[test]
    fn multi_channel_masks_are_rejected() {
        let raw = ArrayD::<f32>::ones(IxDyn(&[1, 3, 3, 2]));
        assert!(matches!(
            MaskBatch::from_raw(raw, 0.5),
            Err(SegEvalError::InvalidShape { what: "mask", .. })
        ));
    }

    #[test]
    fn non_binary_masks_are_rejected() {
        let masks = array![[[0u8, 1], [2, 0]]];
        assert!(matches!(
            MaskBatch::new(masks),
            Err(SegEvalError::NonBinaryMask {
                value: 2,
                position: [0, 1, 0]
            })
        ));
    }

    #[rstest]
    #[case(-0.01)]
    #[case(1.01)]
    #[case(f32::NAN)]
    fn probabilities_outside_unit_interval_are_rejected(#[case] bad: f32) {
        let mut probabilities = Array3::<f32>::from_elem((1, 2, 2), 0.5);
        probabilities[[0, 0, 1]] = bad;
        assert!(matches!(
            ProbabilityBatch::new(probabilities),
            Err(SegEvalError::ProbabilityOutOfRange {
                position: [0, 0, 1],
                ..
            })
        ));
    }

    #[test]
    fn unit_interval_bounds_are_valid_probabilities() {
        let probabilities = array![[[0.0f32, 1.0]]];
        assert!(ProbabilityBatch::new(probabilities).is_ok());
    }

    #[test]
    fn images_and_masks_must_agree_on_shape() {
        let images = ImageBatch::new(Array4::zeros((2, 4, 4, 1))).unwrap();
        let masks = MaskBatch::new(Array3::zeros((2, 4, 5))).unwrap();
        assert!(matches!(
            Dataset::new(images, masks),
            Err(SegEvalError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn dataset_loads_from_npy_files() {
        let dir = tempfile::tempdir().unwrap();
        let images_path = dir.path().join("test_images.npy");
        let masks_path = dir.path().join("test_masks.npy");

        let images = ArrayD::<f32>::from_elem(IxDyn(&[3, 8, 8, 1]), 0.25);
        let masks = ArrayD::<u8>::from_shape_fn(IxDyn(&[3, 8, 8]), |idx| u8::from(idx[1] < 4));
        write_array(&images_path, &images).unwrap();
        write_array(&masks_path, &masks).unwrap();

        let dataset = load_dataset(&images_path, &masks_path, 0.5).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.masks().as_flat().iter().filter(|&&v| v == 1).count(), 3 * 32);
    }

    #[test]
    fn missing_files_surface_as_util_errors() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_dataset(
            &dir.path().join("missing_images.npy"),
            &dir.path().join("missing_masks.npy"),
            0.5,
        );
        assert!(matches!(result, Err(SegEvalError::Util(_))));
    }
}
