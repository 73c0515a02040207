//! Evaluation settings and file locations.

use std::path::{Path, PathBuf};

use burn::config::Config;
use segeval_inference::PostprocessConfig;
use segeval_metric::{DEFAULT_EPSILON, F1ThresholdConfig};
use segeval_model::UNetConfig;

/// File name of the test images inside the data directory.
pub const TEST_IMAGES_FILE: &str = "test_images.npy";
/// File name of the test masks inside the data directory.
pub const TEST_MASKS_FILE: &str = "test_masks.npy";

/// Everything that shapes an evaluation run apart from file locations.
///
/// Loaded from a JSON file via [`EvaluationConfig::load`]; every field has a default.
#[derive(Config, Debug)]
pub struct EvaluationConfig {
    /// Smoothing term for Dice and for F1 during threshold selection.
    #[config(default = "DEFAULT_EPSILON")]
    pub epsilon: f64,

    /// Raw mask values above this become foreground when loading.
    #[config(default = 0.5)]
    pub mask_threshold: f32,

    #[config(default = "PostprocessConfig::new()")]
    pub postprocess: PostprocessConfig,

    /// Number of random samples rendered as `visualization_{i}.png`.
    #[config(default = 5)]
    pub num_samples: usize,

    /// Seed for sample selection; entropy-seeded when absent.
    #[config(default = "None")]
    pub seed: Option<u64>,

    /// Images per forward pass.
    #[config(default = 32)]
    pub batch_size: usize,

    /// Architecture of the model whose weights are loaded.
    #[config(default = "UNetConfig::new()")]
    pub model: UNetConfig,
}

impl EvaluationConfig {
    /// Threshold selection settings derived from `epsilon`.
    pub fn threshold(&self) -> F1ThresholdConfig {
        F1ThresholdConfig::new().with_epsilon(self.epsilon)
    }
}

/// Where an evaluation run reads from and writes to.
#[derive(Debug, Clone)]
pub struct EvaluationPaths {
    /// Directory holding `test_images.npy` and `test_masks.npy`.
    pub data_dir: PathBuf,
    /// Model weight file (`.mpk` or `.bin`).
    pub model_path: PathBuf,
    /// Directory receiving the figures.
    pub output_dir: PathBuf,
    /// Optional JSON report destination.
    pub report_path: Option<PathBuf>,
}

impl EvaluationPaths {
    pub fn new(
        data_dir: impl Into<PathBuf>,
        model_path: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            data_dir: data_dir.into(),
            model_path: model_path.into(),
            output_dir: output_dir.into(),
            report_path: None,
        }
    }

    #[must_use]
    pub fn with_report_path(mut self, path: Option<PathBuf>) -> Self {
        self.report_path = path;
        self
    }

    pub fn images_path(&self) -> PathBuf {
        self.data_dir.join(TEST_IMAGES_FILE)
    }

    pub fn masks_path(&self) -> PathBuf {
        self.data_dir.join(TEST_MASKS_FILE)
    }

    pub fn output_file(&self, name: impl AsRef<Path>) -> PathBuf {
        self.output_dir.join(name)
    }
}

impl Default for EvaluationPaths {
    fn default() -> Self {
        Self::new("NT_DATA/preprocessed", "unet_best_model.mpk", ".")
    }
}

#[cfg(test)]
mod tests {
    use segeval_util::Connectivity;

    use super::*;

    #[test]
    fn defaults_reproduce_the_reference_run() {
        let config = EvaluationConfig::new();
        assert_eq!(config.epsilon, 1e-6);
        assert_eq!(config.mask_threshold, 0.5);
        assert_eq!(config.postprocess.kernel_size, 3);
        assert_eq!(config.postprocess.min_component_size, 100);
        assert_eq!(config.postprocess.connectivity, Connectivity::Eight);
        assert_eq!(config.num_samples, 5);
        assert_eq!(config.seed, None);
        assert_eq!(config.batch_size, 32);

        let paths = EvaluationPaths::default();
        assert_eq!(
            paths.images_path(),
            PathBuf::from("NT_DATA/preprocessed/test_images.npy")
        );
        assert_eq!(paths.model_path, PathBuf::from("unet_best_model.mpk"));
    }

    #[test]
    fn config_round_trips_through_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("evaluation.json");

        let config = EvaluationConfig::new()
            .with_epsilon(1e-4)
            .with_seed(Some(7))
            .with_postprocess(PostprocessConfig::new().with_min_component_size(20));
        config.save(&path).unwrap();

        let loaded = EvaluationConfig::load(&path).unwrap();
        assert_eq!(loaded.epsilon, 1e-4);
        assert_eq!(loaded.seed, Some(7));
        assert_eq!(loaded.postprocess.min_component_size, 20);
        assert_eq!(loaded.threshold().epsilon, 1e-4);
    }
}
