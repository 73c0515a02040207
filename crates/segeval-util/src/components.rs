//! Connected-component labelling of binary masks.

use image::Luma;
use imageproc::region_labelling::{self, Connectivity as PixelConnectivity};
use ndarray::{Array2, ArrayView2};
use serde::{Deserialize, Serialize};

use crate::image::binary_to_gray;

/// Pixel adjacency used when grouping foreground pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Connectivity {
    /// Edge-adjacent neighbours only.
    Four,
    /// Edge- and corner-adjacent neighbours.
    #[default]
    Eight,
}

impl From<Connectivity> for PixelConnectivity {
    fn from(value: Connectivity) -> Self {
        match value {
            Connectivity::Four => Self::Four,
            Connectivity::Eight => Self::Eight,
        }
    }
}

/// Result of labelling a mask.
///
/// Label 0 is background; foreground components are numbered `1..=count`.
#[derive(Debug, Clone)]
pub struct ComponentLabels {
    /// Per-pixel label.
    pub labels: Array2<u32>,
    /// `sizes[i]` is the pixel count of component `i + 1`.
    pub sizes: Vec<usize>,
}

impl ComponentLabels {
    /// Number of foreground components.
    pub fn count(&self) -> usize {
        self.sizes.len()
    }

    /// Pixel count of component `label`, `None` for background or unknown labels.
    pub fn size_of(&self, label: u32) -> Option<usize> {
        if label == 0 {
            return None;
        }
        self.sizes.get(label as usize - 1).copied()
    }
}

/// Label the foreground components of `mask` (non-zero is foreground).
pub fn label_components(mask: ArrayView2<'_, u8>, connectivity: Connectivity) -> ComponentLabels {
    let (height, width) = mask.dim();
    let gray = binary_to_gray(mask);
    let labelled = region_labelling::connected_components(&gray, connectivity.into(), Luma([0u8]));

    let labels = Array2::from_shape_fn((height, width), |(y, x)| {
        labelled.get_pixel(x as u32, y as u32)[0]
    });

    let count = labels.iter().copied().max().unwrap_or(0) as usize;
    let mut sizes = vec![0usize; count];
    for &label in labels.iter().filter(|&&l| l > 0) {
        sizes[label as usize - 1] += 1;
    }

    ComponentLabels { labels, sizes }
}

/// Zero every foreground component with fewer than `min_size` pixels.
///
/// Returns a `{0, 1}` mask. A mask without any foreground yields all zeros.
pub fn remove_small_components(
    mask: ArrayView2<'_, u8>,
    min_size: usize,
    connectivity: Connectivity,
) -> Array2<u8> {
    let components = label_components(mask, connectivity);
    if components.count() == 0 {
        return Array2::zeros(mask.dim());
    }

    let keep: Vec<bool> = components.sizes.iter().map(|&size| size >= min_size).collect();
    tracing::trace!(
        components = components.count(),
        kept = keep.iter().filter(|&&k| k).count(),
        min_size,
        "filtered connected components",
    );

    components
        .labels
        .mapv(|label| u8::from(label > 0 && keep[label as usize - 1]))
}

#[cfg(test)]
mod tests {
    use ndarray::{Array2, s};
    use rstest::*;

    use super::*;

    #[test]
    fn diagonal_pixels_depend_on_connectivity() {
        let mut mask = Array2::<u8>::zeros((3, 3));
        mask[[0, 0]] = 1;
        mask[[1, 1]] = 1;
        mask[[2, 2]] = 1;

        assert_eq!(label_components(mask.view(), Connectivity::Eight).count(), 1);
        assert_eq!(label_components(mask.view(), Connectivity::Four).count(), 3);
    }

    #[test]
    fn sizes_match_component_areas() {
        let mut mask = Array2::<u8>::zeros((10, 10));
        mask.slice_mut(s![0..2, 0..3]).fill(1);
        mask.slice_mut(s![5..9, 5..9]).fill(1);
        let components = label_components(mask.view(), Connectivity::Eight);

        let mut sizes = components.sizes.clone();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![6, 16]);
        assert_eq!(components.size_of(0), None);
        assert_eq!(components.size_of(3), None);
    }

    #[rstest]
    #[case(9, 11, 0)] // 99 pixels are dropped
    #[case(10, 10, 100)] // 100 pixels are kept
    #[case(10, 11, 110)]
    fn min_size_boundary(#[case] h: usize, #[case] w: usize, #[case] expected: usize) {
        let mut mask = Array2::<u8>::zeros((32, 32));
        mask.slice_mut(s![4..4 + h, 4..4 + w]).fill(1);
        let cleaned = remove_small_components(mask.view(), 100, Connectivity::Eight);
        assert_eq!(cleaned.iter().filter(|&&v| v == 1).count(), expected);
    }

    #[test]
    fn empty_mask_stays_empty() {
        let mask = Array2::<u8>::zeros((8, 8));
        let cleaned = remove_small_components(mask.view(), 100, Connectivity::Eight);
        assert!(cleaned.iter().all(|&v| v == 0));
    }

    #[test]
    fn only_small_components_are_removed() {
        let mut mask = Array2::<u8>::zeros((40, 40));
        mask.slice_mut(s![0..12, 0..12]).fill(1);
        mask.slice_mut(s![30..33, 30..33]).fill(1);
        let cleaned = remove_small_components(mask.view(), 100, Connectivity::Eight);

        assert!(cleaned.slice(s![0..12, 0..12]).iter().all(|&v| v == 1));
        assert!(cleaned.slice(s![30..33, 30..33]).iter().all(|&v| v == 0));
    }
}
