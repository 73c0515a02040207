//! U-Net for binary segmentation.
//!
//! Encoder: `depth` stages of two 3×3 conv + BatchNorm + ReLU layers, each
//! followed by 2×2 max pooling, with the channel count doubling per stage.
//! Decoder: 2×2 transposed convolutions back up, concatenating the matching
//! encoder features before each conv block. A 1×1 convolution produces one
//! logit per pixel.

use burn::{
    nn::{
        BatchNorm, BatchNormConfig, PaddingConfig2d, Relu,
        conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig},
        pool::{MaxPool2d, MaxPool2dConfig},
    },
    prelude::*,
};

use crate::error::{ModelError, ModelResult};

/// Configuration for a double 3×3 convolution block.
#[derive(Config, Debug)]
pub struct ConvBlockConfig {
    in_channels: usize,
    out_channels: usize,
}

impl ConvBlockConfig {
    /// Initializes a `ConvBlock` module.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> ConvBlock<B> {
        let conv1 = Conv2dConfig::new([self.in_channels, self.out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);
        let conv2 = Conv2dConfig::new([self.out_channels, self.out_channels], [3, 3])
            .with_padding(PaddingConfig2d::Explicit(1, 1))
            .init(device);

        ConvBlock {
            conv1,
            norm1: BatchNormConfig::new(self.out_channels).init(device),
            conv2,
            norm2: BatchNormConfig::new(self.out_channels).init(device),
            activation: Relu::new(),
        }
    }
}

/// Two `conv -> batch norm -> relu` layers at constant resolution.
#[derive(Module, Debug)]
pub struct ConvBlock<B: Backend> {
    conv1: Conv2d<B>,
    norm1: BatchNorm<B, 2>,
    conv2: Conv2d<B>,
    norm2: BatchNorm<B, 2>,
    activation: Relu,
}

impl<B: Backend> ConvBlock<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = self.activation.forward(self.norm1.forward(self.conv1.forward(x)));
        self.activation.forward(self.norm2.forward(self.conv2.forward(x)))
    }
}

/// Configuration for the [`UNet`] model.
#[derive(Config, Debug)]
pub struct UNetConfig {
    /// Channels of the input image (1 for grayscale, 3 for RGB).
    #[config(default = "1")]
    pub in_channels: usize,
    /// Feature channels of the first encoder stage.
    #[config(default = "16")]
    pub base_channels: usize,
    /// Number of down-sampling stages. Input height and width must be
    /// divisible by `2^depth`.
    #[config(default = "4")]
    pub depth: usize,
}

impl UNetConfig {
    /// Initializes a `UNet` with freshly initialized weights.
    pub fn init<B: Backend>(&self, device: &Device<B>) -> ModelResult<UNet<B>> {
        self.validate()?;

        let channels = |stage: usize| self.base_channels << stage;

        let mut encoders = Vec::with_capacity(self.depth);
        for stage in 0..self.depth {
            let in_channels = if stage == 0 {
                self.in_channels
            } else {
                channels(stage - 1)
            };
            encoders.push(ConvBlockConfig::new(in_channels, channels(stage)).init(device));
        }

        let bottleneck_in = if self.depth == 0 {
            self.in_channels
        } else {
            channels(self.depth - 1)
        };
        let bottleneck = ConvBlockConfig::new(bottleneck_in, channels(self.depth)).init(device);

        // decoder stages run from the deepest level back to the first
        let mut upsamples = Vec::with_capacity(self.depth);
        let mut decoders = Vec::with_capacity(self.depth);
        for stage in (0..self.depth).rev() {
            upsamples.push(
                ConvTranspose2dConfig::new([channels(stage + 1), channels(stage)], [2, 2])
                    .with_stride([2, 2])
                    .init(device),
            );
            decoders.push(ConvBlockConfig::new(2 * channels(stage), channels(stage)).init(device));
        }

        let head = Conv2dConfig::new([channels(0), 1], [1, 1]).init(device);

        Ok(UNet {
            encoders,
            pool: MaxPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            bottleneck,
            upsamples,
            decoders,
            head,
        })
    }

    /// Spatial dimensions must be multiples of this value.
    pub const fn spatial_multiple(&self) -> usize {
        1 << self.depth
    }

    fn validate(&self) -> ModelResult<()> {
        if self.in_channels == 0 || self.base_channels == 0 {
            return Err(ModelError::InvalidConfiguration {
                reason: "channel counts must be positive".to_string(),
            });
        }
        if self.depth > 8 {
            return Err(ModelError::InvalidConfiguration {
                reason: format!("depth {} exceeds the supported maximum of 8", self.depth),
            });
        }
        Ok(())
    }
}

/// U-Net producing one foreground logit per pixel.
#[derive(Module, Debug)]
pub struct UNet<B: Backend> {
    encoders: Vec<ConvBlock<B>>,
    pool: MaxPool2d,
    bottleneck: ConvBlock<B>,
    upsamples: Vec<ConvTranspose2d<B>>,
    decoders: Vec<ConvBlock<B>>,
    head: Conv2d<B>,
}

impl<B: Backend> UNet<B> {
    /// Forward pass.
    ///
    /// # Shapes
    ///   - Input `[batch, in_channels, height, width]`
    ///   - Output `[batch, 1, height, width]` logits
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let mut skips = Vec::with_capacity(self.encoders.len());
        let mut x = x;
        for encoder in &self.encoders {
            let features = encoder.forward(x);
            x = self.pool.forward(features.clone());
            skips.push(features);
        }

        x = self.bottleneck.forward(x);

        let stages = self.upsamples.iter().zip(&self.decoders);
        for ((upsample, decoder), skip) in stages.zip(skips.into_iter().rev()) {
            let up = upsample.forward(x);
            x = decoder.forward(Tensor::cat(vec![up, skip], 1));
        }

        self.head.forward(x)
    }

    /// Number of down-sampling stages.
    pub fn depth(&self) -> usize {
        self.encoders.len()
    }
}

#[cfg(test)]
mod tests {
    use rstest::*;

    use super::*;
    use crate::tests::TestBackend;

    #[rstest]
    #[case(1, 2, [1, 1, 8, 8])]
    #[case(3, 1, [2, 3, 16, 8])]
    #[case(1, 0, [1, 1, 5, 7])]
    fn forward_preserves_spatial_shape(
        #[case] in_channels: usize,
        #[case] depth: usize,
        #[case] input: [usize; 4],
    ) {
        let device = Default::default();
        let model = UNetConfig::new()
            .with_in_channels(in_channels)
            .with_base_channels(4)
            .with_depth(depth)
            .init::<TestBackend>(&device)
            .unwrap();

        let x = Tensor::<TestBackend, 4>::ones(input, &device);
        let [batch, _, height, width] = input;
        assert_eq!(model.forward(x).dims(), [batch, 1, height, width]);
        assert_eq!(model.depth(), depth);
    }

    #[test]
    fn invalid_configurations_are_rejected() {
        let device = Default::default();
        let zero_channels = UNetConfig::new()
            .with_base_channels(0)
            .init::<TestBackend>(&device);
        assert!(matches!(
            zero_channels,
            Err(ModelError::InvalidConfiguration { .. })
        ));

        let too_deep = UNetConfig::new().with_depth(9).init::<TestBackend>(&device);
        assert!(matches!(too_deep, Err(ModelError::InvalidConfiguration { .. })));
    }

    #[test]
    fn spatial_multiple_follows_depth() {
        assert_eq!(UNetConfig::new().spatial_multiple(), 16);
        assert_eq!(UNetConfig::new().with_depth(0).spatial_multiple(), 1);
    }
}
