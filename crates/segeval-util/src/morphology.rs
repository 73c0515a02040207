//! Binary morphological closing.
//!
//! Masks are `u8` arrays where any non-zero value is foreground. Results are
//! always `{0, 1}` masks of the same shape. Pixels outside the image never
//! contribute, so a foreground region touching the border is not eaten
//! away.

use imageproc::{distance_transform::Norm, morphology};
use ndarray::{Array2, ArrayView2};

use crate::{
    error::{UtilError, UtilResult},
    image::{binary_to_gray, gray_to_binary},
};

/// Square all-ones structuring element, anchored at its centre.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructuringElement {
    size: usize,
}

impl StructuringElement {
    /// Create a `size`×`size` square element. `size` must be odd.
    pub fn square(size: usize) -> UtilResult<Self> {
        if size == 0 || size % 2 == 0 || size > 511 {
            return Err(UtilError::InvalidKernelSize { size });
        }
        Ok(Self { size })
    }

    /// Side length of the element.
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Chebyshev radius of the element; 0 for a single pixel.
    pub const fn radius(&self) -> u8 {
        // size <= 511 is enforced by `square`
        ((self.size - 1) / 2) as u8
    }

    /// Anchor point (center) of the element.
    pub const fn anchor(&self) -> (usize, usize) {
        (self.size / 2, self.size / 2)
    }
}

/// Morphological closing (dilation followed by erosion).
///
/// Fills holes and gaps narrower than the element without growing the
/// overall extent of a region.
pub fn closing(mask: ArrayView2<'_, u8>, element: &StructuringElement) -> Array2<u8> {
    if element.radius() == 0 {
        return mask.mapv(|v| u8::from(v > 0));
    }
    gray_to_binary(&morphology::close(
        &binary_to_gray(mask),
        Norm::LInf,
        element.radius(),
    ))
}
