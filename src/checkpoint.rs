use anyhow::{Context, Result};
use burn::module::Module;
use burn::record::{CompactRecorder, Recorder};
use burn::tensor::backend::Backend;
use std::path::Path;

use crate::config::{EncoderConfig, GeneratorConfig};
use crate::encoder::Encoder;
use crate::generator::Generator;

/// Build the generator from its config and load pretrained weights into it.
/// A missing tensor or a shape mismatch surfaces here, naming the file.
pub fn load_generator<B: Backend>(
    config: &GeneratorConfig,
    path: &Path,
    device: &B::Device,
) -> Result<Generator<B>> {
    let recorder = CompactRecorder::new();
    let record = recorder
        .load(path.to_path_buf(), device)
        .with_context(|| format!("failed to load generator weights from {}", path.display()))?;
    Ok(config.init(device).load_record(record))
}

/// Same contract as [`load_generator`], for the encoder.
pub fn load_encoder<B: Backend>(
    config: &EncoderConfig,
    path: &Path,
    device: &B::Device,
) -> Result<Encoder<B>> {
    let recorder = CompactRecorder::new();
    let record = recorder
        .load(path.to_path_buf(), device)
        .with_context(|| format!("failed to load encoder weights from {}", path.display()))?;
    Ok(config.init(device).load_record(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray;

    #[test]
    fn missing_checkpoint_names_the_file() {
        let device = Default::default();
        let err = load_generator::<B>(
            &GeneratorConfig::new().with_ngf(4),
            Path::new("no/such/checkpoint"),
            &device,
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("no/such/checkpoint"));
    }

    #[test]
    fn saved_weights_round_trip() {
        let device = Default::default();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("encoder");

        let config = EncoderConfig::new().with_ndf(4);
        let encoder = config.init::<B>(&device);
        let recorder = CompactRecorder::new();
        recorder
            .record(encoder.into_record(), path.clone())
            .unwrap();

        assert!(load_encoder::<B>(&config, &path, &device).is_ok());
    }
}
