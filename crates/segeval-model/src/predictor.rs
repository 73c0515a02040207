//! Array-level prediction interface.

use burn::{
    prelude::*,
    tensor::{DType, activation::sigmoid},
};
use ndarray::{Array3, ArrayView4, Axis, concatenate};

use crate::{
    error::{ModelError, ModelResult},
    unet::{UNet, UNetConfig},
};

/// Default number of images per forward pass.
pub const DEFAULT_BATCH_SIZE: usize = 32;

/// Anything that maps a batch of images to per-pixel foreground probabilities.
///
/// `images` is laid out `[N, H, W, C]`; the result must be `[N, H, W]` with
/// every value in `[0, 1]`.
pub trait SegmentationModel {
    fn predict(&self, images: ArrayView4<'_, f32>) -> ModelResult<Array3<f32>>;
}

impl<F> SegmentationModel for F
where
    F: Fn(ArrayView4<'_, f32>) -> ModelResult<Array3<f32>>,
{
    fn predict(&self, images: ArrayView4<'_, f32>) -> ModelResult<Array3<f32>> {
        self(images)
    }
}

/// Runs a [`UNet`] over NHWC arrays in mini-batches.
#[derive(Debug)]
pub struct UNetPredictor<B: Backend> {
    model: UNet<B>,
    device: B::Device,
    in_channels: usize,
    spatial_multiple: usize,
    batch_size: usize,
}

impl<B: Backend> UNetPredictor<B> {
    pub fn new(model: UNet<B>, config: &UNetConfig, device: B::Device) -> Self {
        Self {
            model,
            device,
            in_channels: config.in_channels,
            spatial_multiple: config.spatial_multiple(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Number of images per forward pass. Zero is treated as one.
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    fn check_shape(&self, images: &ArrayView4<'_, f32>) -> ModelResult<()> {
        let (_, height, width, channels) = images.dim();
        let multiple = self.spatial_multiple;
        if channels != self.in_channels || height % multiple != 0 || width % multiple != 0 {
            return Err(ModelError::InvalidInputShape {
                expected: format!(
                    "[N, H, W, {}] with H and W divisible by {multiple}",
                    self.in_channels
                ),
                actual: images.shape().to_vec(),
            });
        }
        Ok(())
    }

    fn predict_chunk(&self, chunk: ArrayView4<'_, f32>) -> ModelResult<Array3<f32>> {
        let (batch, height, width, channels) = chunk.dim();
        let values: Vec<f32> = chunk.iter().copied().collect();

        let input = Tensor::<B, 1>::from_floats(values.as_slice(), &self.device)
            .reshape([batch, height, width, channels])
            .permute([0, 3, 1, 2]);
        let probabilities = sigmoid(self.model.forward(input));

        let data = probabilities
            .reshape([batch, height, width])
            .into_data()
            .convert_dtype(DType::F32)
            .to_vec::<f32>()
            .map_err(|e| ModelError::TensorConversion {
                reason: format!("{e:?}"),
            })?;

        Array3::from_shape_vec((batch, height, width), data).map_err(|e| {
            ModelError::TensorConversion {
                reason: e.to_string(),
            }
        })
    }
}

impl<B: Backend> SegmentationModel for UNetPredictor<B> {
    fn predict(&self, images: ArrayView4<'_, f32>) -> ModelResult<Array3<f32>> {
        self.check_shape(&images)?;
        let (_, height, width, _) = images.dim();
        if images.len_of(Axis(0)) == 0 {
            return Ok(Array3::zeros((0, height, width)));
        }

        let chunks = images
            .axis_chunks_iter(Axis(0), self.batch_size)
            .map(|chunk| self.predict_chunk(chunk))
            .collect::<ModelResult<Vec<_>>>()?;
        tracing::debug!(batches = chunks.len(), "ran model inference");

        let views: Vec<_> = chunks.iter().map(Array3::view).collect();
        concatenate(Axis(0), &views).map_err(|e| ModelError::TensorConversion {
            reason: e.to_string(),
        })
    }
}
