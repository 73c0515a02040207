//! Reading and writing `.npy` array files.
//!
//! Test sets are produced by external tooling and arrive with whatever dtype the
//! producer used. [`read_array`] accepts the common numeric dtypes and widens
//! or narrows everything to `f32`.

use std::path::Path;

use ndarray::ArrayD;
use ndarray_npy::{ReadNpyError, ReadableElement, WritableElement, read_npy, write_npy};

use crate::error::{UtilError, UtilResult};

/// Read an `.npy` file of any supported numeric dtype as an `f32` array.
///
/// Supported dtypes: `f32`, `f64`, `u8`, `i32`, `i64`, `bool`.
pub fn read_array(path: impl AsRef<Path>) -> UtilResult<ArrayD<f32>> {
    let path = path.as_ref();

    macro_rules! try_dtype {
        ($ty:ty, $convert:expr) => {
            if let Some(array) = try_read::<$ty>(path)? {
                tracing::debug!(
                    path = %path.display(),
                    dtype = stringify!($ty),
                    shape = ?array.shape(),
                    "read array file",
                );
                return Ok(array.mapv($convert));
            }
        };
    }

    try_dtype!(f32, |v: f32| v);
    try_dtype!(f64, |v: f64| v as f32);
    try_dtype!(u8, f32::from);
    try_dtype!(i64, |v: i64| v as f32);
    try_dtype!(i32, |v: i32| v as f32);
    try_dtype!(bool, |v: bool| if v { 1.0 } else { 0.0 });

    Err(UtilError::ArrayRead {
        path: path.to_path_buf(),
        reason: "unsupported dtype (expected f32, f64, u8, i32, i64 or bool)".to_string(),
    })
}

/// Write an array as an `.npy` file.
pub fn write_array<A: WritableElement>(
    path: impl AsRef<Path>,
    array: &ArrayD<A>,
) -> UtilResult<()> {
    let path = path.as_ref();
    write_npy(path, array).map_err(|e| UtilError::ArrayWrite {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

/// `Ok(None)` when the file holds a different dtype, so the caller can try the next one.
fn try_read<A: ReadableElement>(path: &Path) -> UtilResult<Option<ArrayD<A>>> {
    match read_npy::<_, ArrayD<A>>(path) {
        Ok(array) => Ok(Some(array)),
        Err(ReadNpyError::WrongDescriptor(_)) => Ok(None),
        Err(e) => Err(UtilError::ArrayRead {
            path: path.to_path_buf(),
            reason: e.to_string(),
        }),
    }
}
