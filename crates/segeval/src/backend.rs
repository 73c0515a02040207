//! Backend selection based on cargo features.
//!
//! `cuda` wins over `wgpu`, which wins over the default `ndarray` CPU backend.

use cfg_if::cfg_if;

cfg_if! {
    if #[cfg(feature = "cuda")] {
        pub mod burn_backend_types {
            use burn::backend::cuda::{Cuda, CudaDevice};

            /// Backend used for model inference.
            pub type InferenceBackend = Cuda;
            /// Device type of [`InferenceBackend`].
            pub type InferenceDevice = CudaDevice;
            /// Backend name for logging.
            pub const NAME: &str = "CUDA (NVIDIA GPU)";
        }
    } else if #[cfg(feature = "wgpu")] {
        pub mod burn_backend_types {
            use burn::backend::wgpu::{Wgpu, WgpuDevice};

            /// Backend used for model inference.
            pub type InferenceBackend = Wgpu;
            /// Device type of [`InferenceBackend`].
            pub type InferenceDevice = WgpuDevice;
            /// Backend name for logging.
            pub const NAME: &str = "WGPU (GPU)";
        }
    } else {
        pub mod burn_backend_types {
            use burn::backend::ndarray::{NdArray, NdArrayDevice};

            /// Backend used for model inference.
            pub type InferenceBackend = NdArray;
            /// Device type of [`InferenceBackend`].
            pub type InferenceDevice = NdArrayDevice;
            /// Backend name for logging.
            pub const NAME: &str = "NdArray (CPU)";
        }
    }
}
