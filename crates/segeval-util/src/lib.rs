//! Low-level helpers shared by the segeval crates.
//!
//! - [`morphology`]: binary closing with square structuring elements.
//! - [`components`]: connected-component labelling and small-region removal.
//! - [`npy`]: reading `.npy` array files into `f32` arrays regardless of stored dtype.
//! - [`image`]: conversions between arrays and `image` buffers, panel composition.
//! - [`plot`]: minimal raster line plots used for diagnostic figures.

pub mod components;
pub mod error;
pub mod image;
pub mod morphology;
pub mod npy;
pub mod plot;

pub use components::{ComponentLabels, Connectivity, label_components, remove_small_components};
pub use error::{UtilError, UtilResult};
pub use morphology::{StructuringElement, closing};
pub use npy::{read_array, write_array};
