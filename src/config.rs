use anyhow::{bail, Result};
use burn::config::Config;

/// Downsampling depth of the generator U-Net. Both axes of the input image
/// halves must be divisible by 2^NUM_DOWNS.
pub const NUM_DOWNS: usize = 8;

/// Latent code length shared by the generator and the encoder.
pub const LATENT_DIM: usize = 8;

/// Hyperparameters of the U-Net generator. The topology is fixed data known
/// at build time; a checkpoint whose tensors disagree with it fails at load
/// with a diagnostic naming the checkpoint file.
#[derive(Config, Debug)]
pub struct GeneratorConfig {
    /// Input channels (the edge domain is single-channel).
    #[config(default = 1)]
    pub input_nc: usize,
    /// Output channels.
    #[config(default = 3)]
    pub output_nc: usize,
    /// Latent code length.
    #[config(default = 8)]
    pub nz: usize,
    /// Base filter width.
    #[config(default = 64)]
    pub ngf: usize,
    /// Dropout on the inner up stages. Inert on a non-autodiff backend, so
    /// inference output is unaffected either way.
    #[config(default = true)]
    pub use_dropout: bool,
}

/// Hyperparameters of the ResNet encoder with a variational dual head.
#[derive(Config, Debug)]
pub struct EncoderConfig {
    /// Input channels (the photo domain).
    #[config(default = 3)]
    pub input_nc: usize,
    /// Latent code length of both heads.
    #[config(default = 8)]
    pub nz: usize,
    /// Base filter width.
    #[config(default = 64)]
    pub ndf: usize,
    /// Residual depth: one stem conv plus `n_blocks - 1` downsampling blocks.
    #[config(default = 5)]
    pub n_blocks: usize,
}

/// A negative id is a fatal precondition failure; there is no CPU fallback.
/// Called before any model construction.
pub fn validate_gpu_id(gpu: i64) -> Result<usize> {
    if gpu < 0 {
        bail!("GPU id must be >= 0, got {gpu}");
    }
    Ok(gpu as usize)
}
