//! # segeval model
//!
//! The model side of an evaluation run: the [`SegmentationModel`] trait that
//! the evaluation pipeline talks to, and a Burn U-Net implementing it.
//!
//! - `unet`: the network and its [`UNetConfig`].
//! - `predictor`: [`UNetPredictor`], batched NHWC-array-in, probability-array-out.
//! - `weights`: loading and saving U-Net records.
//! - `error`: [`ModelError`].

mod error;
mod predictor;
mod unet;
mod weights;

#[doc(inline)]
pub use error::{ModelError, ModelResult};
#[doc(inline)]
pub use predictor::{DEFAULT_BATCH_SIZE, SegmentationModel, UNetPredictor};
#[doc(inline)]
pub use unet::{ConvBlock, ConvBlockConfig, UNet, UNetConfig, UNetRecord};
#[doc(inline)]
pub use weights::{WeightFormat, load_unet, save_unet};
