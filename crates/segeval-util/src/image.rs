//! Conversions between `ndarray` arrays and `image` buffers.

use image::{GrayImage, Luma, Rgb, RgbImage, imageops};
use ndarray::{Array2, ArrayView2, ArrayView3};

use crate::error::{UtilError, UtilResult};

/// White background used between composed panels.
pub const PANEL_BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);

/// Convert a binary mask (non-zero is foreground) into a 0/255 grayscale image.
pub fn binary_to_gray(mask: ArrayView2<'_, u8>) -> GrayImage {
    let (height, width) = mask.dim();
    GrayImage::from_fn(width as u32, height as u32, |x, y| {
        Luma([if mask[[y as usize, x as usize]] > 0 { 255 } else { 0 }])
    })
}

/// Convert a grayscale image back into a `{0, 1}` mask.
pub fn gray_to_binary(image: &GrayImage) -> Array2<u8> {
    let (width, height) = image.dimensions();
    Array2::from_shape_fn((height as usize, width as usize), |(y, x)| {
        u8::from(image.get_pixel(x as u32, y as u32)[0] > 0)
    })
}

/// Render a `{0, 1}` mask as a black/white RGB image.
pub fn mask_to_rgb(mask: ArrayView2<'_, u8>) -> RgbImage {
    let (height, width) = mask.dim();
    RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let v = if mask[[y as usize, x as usize]] > 0 { 255 } else { 0 };
        Rgb([v, v, v])
    })
}

/// Render a probability map in `[0, 1]` as a grayscale RGB image.
pub fn probability_to_rgb(probabilities: ArrayView2<'_, f32>) -> RgbImage {
    let (height, width) = probabilities.dim();
    RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let v = unit_to_u8(probabilities[[y as usize, x as usize]]);
        Rgb([v, v, v])
    })
}

/// Render an `H×W×C` image array as RGB.
///
/// Single-channel images are min-max stretched to the full gray range.
/// Three-channel images are taken as-is when they already look like `u8`
/// intensities (max above 1), otherwise as `[0, 1]` floats.
pub fn image_to_rgb(image: ArrayView3<'_, f32>) -> UtilResult<RgbImage> {
    let (height, width, channels) = image.dim();
    match channels {
        1 => {
            let (min, max) = image
                .iter()
                .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                    (lo.min(v), hi.max(v))
                });
            let range = max - min;
            Ok(RgbImage::from_fn(width as u32, height as u32, |x, y| {
                let raw = image[[y as usize, x as usize, 0]];
                let v = if range > f32::EPSILON {
                    unit_to_u8((raw - min) / range)
                } else {
                    0
                };
                Rgb([v, v, v])
            }))
        }
        3 => {
            let max = image.iter().copied().fold(f32::NEG_INFINITY, f32::max);
            let scale = if max > 1.0 { 1.0 } else { 255.0 };
            Ok(RgbImage::from_fn(width as u32, height as u32, |x, y| {
                let px = |c: usize| {
                    (image[[y as usize, x as usize, c]] * scale).clamp(0.0, 255.0) as u8
                };
                Rgb([px(0), px(1), px(2)])
            }))
        }
        _ => Err(UtilError::InvalidShape {
            expected: "H x W x 1 or H x W x 3".to_string(),
            actual: vec![height, width, channels],
        }),
    }
}

/// Place panels side by side, top-aligned, separated by `gap` pixels of white.
pub fn compose_horizontal(panels: &[RgbImage], gap: u32) -> RgbImage {
    let height = panels.iter().map(RgbImage::height).max().unwrap_or(0);
    let width = panels.iter().map(RgbImage::width).sum::<u32>()
        + gap * (panels.len().saturating_sub(1) as u32);
    let mut canvas = RgbImage::from_pixel(width.max(1), height.max(1), PANEL_BACKGROUND);

    let mut offset = 0i64;
    for panel in panels {
        imageops::replace(&mut canvas, panel, offset, 0);
        offset += i64::from(panel.width() + gap);
    }
    canvas
}

/// Upscale an image with nearest-neighbour sampling so small masks stay crisp.
pub fn upscale_nearest(image: &RgbImage, factor: u32) -> RgbImage {
    if factor <= 1 {
        return image.clone();
    }
    imageops::resize(
        image,
        image.width() * factor,
        image.height() * factor,
        imageops::FilterType::Nearest,
    )
}

fn unit_to_u8(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}
