//! Loading and saving U-Net weights with Burn's file recorders.

use std::path::Path;

use burn::{
    module::Module,
    record::{BinFileRecorder, FullPrecisionSettings, NamedMpkFileRecorder},
    tensor::backend::Backend,
};

use crate::{
    error::{ModelError, ModelResult},
    unet::{UNet, UNetConfig},
};

/// Supported weight file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightFormat {
    /// Burn named MessagePack `.mpk` files
    MessagePack,
    /// Burn binary `.bin` files
    Binary,
}

impl WeightFormat {
    /// Detect the format from a file extension.
    pub fn from_path(path: &Path) -> ModelResult<Self> {
        match path.extension().and_then(|s| s.to_str()) {
            Some("mpk") => Ok(Self::MessagePack),
            Some("bin") => Ok(Self::Binary),
            other => Err(ModelError::UnsupportedFormat {
                format: other.unwrap_or("<none>").to_string(),
            }),
        }
    }
}

/// Build a U-Net from `config` and load its weights from `path`.
///
/// The architecture in `config` must match the one the weights were saved from.
pub fn load_unet<B: Backend>(
    path: &Path,
    config: &UNetConfig,
    device: &B::Device,
) -> ModelResult<UNet<B>> {
    let format = WeightFormat::from_path(path)?;
    if !path.is_file() {
        return Err(ModelError::WeightLoading {
            path: path.to_path_buf(),
            reason: "file not found".to_string(),
        });
    }

    let model = config.init::<B>(device)?;
    let loaded = match format {
        WeightFormat::MessagePack => {
            let recorder = NamedMpkFileRecorder::<FullPrecisionSettings>::new();
            model.load_file(path, &recorder, device)
        }
        WeightFormat::Binary => {
            let recorder = BinFileRecorder::<FullPrecisionSettings>::new();
            model.load_file(path, &recorder, device)
        }
    };

    let model = loaded.map_err(|e| ModelError::WeightLoading {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    tracing::debug!(path = %path.display(), ?format, "loaded U-Net weights");
    Ok(model)
}

/// Save a U-Net's weights to `path` in the format given by its extension.
pub fn save_unet<B: Backend>(model: UNet<B>, path: &Path) -> ModelResult<()> {
    let result = match WeightFormat::from_path(path)? {
        WeightFormat::MessagePack => {
            model.save_file(path, &NamedMpkFileRecorder::<FullPrecisionSettings>::new())
        }
        WeightFormat::Binary => {
            model.save_file(path, &BinFileRecorder::<FullPrecisionSettings>::new())
        }
    };

    result.map_err(|e| ModelError::WeightSaving {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use burn::tensor::{Distribution, Tensor, Tolerance};
    use rstest::*;

    use super::*;
    use crate::tests::TestBackend;

    #[rstest]
    #[case("weights.mpk", Some(WeightFormat::MessagePack))]
    #[case("dir/weights.bin", Some(WeightFormat::Binary))]
    #[case("weights.pth", None)]
    #[case("weights", None)]
    fn format_is_detected_from_extension(
        #[case] path: &str,
        #[case] expected: Option<WeightFormat>,
    ) {
        assert_eq!(WeightFormat::from_path(&PathBuf::from(path)).ok(), expected);
    }

    #[rstest]
    #[case("unet.mpk")]
    #[case("unet.bin")]
    fn saved_weights_reload_identically(#[case] file_name: &str) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(file_name);
        let device = Default::default();
        let config = UNetConfig::new().with_base_channels(2).with_depth(1);

        let model = config.init::<TestBackend>(&device).unwrap();
        let input = Tensor::<TestBackend, 4>::random(
            [1, 1, 4, 4],
            Distribution::Uniform(0.0, 1.0),
            &device,
        );
        let expected = model.forward(input.clone());

        save_unet(model, &path).unwrap();
        let reloaded = load_unet::<TestBackend>(&path, &config, &device).unwrap();
        let actual = reloaded.forward(input);

        actual
            .into_data()
            .assert_approx_eq::<f32>(&expected.into_data(), Tolerance::relative(1e-5));
    }

    #[test]
    fn missing_file_is_reported() {
        let device = Default::default();
        let result = load_unet::<TestBackend>(
            Path::new("/nonexistent/unet.mpk"),
            &UNetConfig::new(),
            &device,
        );
        assert!(matches!(result, Err(ModelError::WeightLoading { .. })));
    }
}
