use anyhow::Result;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use image::RgbImage;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

use crate::data;
use crate::encoder::Encoder;
use crate::generator::Generator;

/// Number of pre-drawn latent codes; the encoder contributes one more.
pub const N_SAMPLES: usize = 33;

/// Seed of the pre-drawn latent table.
pub const TABLE_SEED: u64 = 0;

#[derive(Debug, Clone)]
pub struct SampleOptions {
    pub n_samples: usize,
    pub table_seed: u64,
    /// Seed for the encoder-path noise draw. `None` draws from entropy, so
    /// the first sample varies across runs; the table-driven samples stay
    /// reproducible either way.
    pub encode_seed: Option<u64>,
}

impl Default for SampleOptions {
    fn default() -> Self {
        Self {
            n_samples: N_SAMPLES,
            table_seed: TABLE_SEED,
            encode_seed: None,
        }
    }
}

/// Standard-normal matrix of shape (count, nz), drawn row-major from one
/// seeded generator. Bit-identical for a given seed.
pub fn latent_table(seed: u64, count: usize, nz: usize) -> Vec<Vec<f32>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            (0..nz)
                .map(|_| {
                    let v: f32 = StandardNormal.sample(&mut rng);
                    v
                })
                .collect()
        })
        .collect()
}

/// `z = eps * exp(0.5 * logvar) + mu`.
pub fn reparameterize<B: Backend>(
    mu: Tensor<B, 2>,
    logvar: Tensor<B, 2>,
    eps: Tensor<B, 2>,
) -> Tensor<B, 2> {
    let std = (logvar * 0.5).exp();
    eps * std + mu
}

/// Runs the generator once per latent code and denormalizes each output.
///
/// Sample 0 encodes the reference tensor and reparameterizes; samples
/// `1..=n_samples` take consecutive rows of the seeded latent table. Any
/// forward-pass or transfer error aborts the run; there are no partial
/// results.
pub fn synthesize<B: Backend>(
    generator: &Generator<B>,
    encoder: &Encoder<B>,
    x_a: Tensor<B, 4>,
    x_b: Tensor<B, 4>,
    options: &SampleOptions,
    device: &B::Device,
) -> Result<Vec<RgbImage>> {
    let nz = generator.nz();
    let table = latent_table(options.table_seed, options.n_samples, nz);

    let mut eps_rng = match options.encode_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let mut outputs = Vec::with_capacity(options.n_samples + 1);
    for i in 0..=options.n_samples {
        let z = if i == 0 {
            let (mu, logvar) = encoder.forward(x_b.clone());
            let eps_vals: Vec<f32> = (0..nz)
                .map(|_| {
                    let v: f32 = StandardNormal.sample(&mut eps_rng);
                    v
                })
                .collect();
            let eps = Tensor::<B, 1>::from_floats(eps_vals.as_slice(), device).reshape([1, nz]);
            reparameterize(mu, logvar, eps)
        } else {
            Tensor::<B, 1>::from_floats(table[i - 1].as_slice(), device).reshape([1, nz])
        };

        let y = generator.forward(x_a.clone(), z);
        outputs.push(data::tensor_to_image(y)?);
    }
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray;

    #[test]
    fn latent_table_is_reproducible() {
        let a = latent_table(TABLE_SEED, N_SAMPLES, 8);
        let b = latent_table(TABLE_SEED, N_SAMPLES, 8);
        assert_eq!(a.len(), 33);
        assert!(a.iter().all(|row| row.len() == 8));
        assert_eq!(a, b);
    }

    #[test]
    fn latent_table_varies_with_seed() {
        assert_ne!(latent_table(0, 1, 8), latent_table(1, 1, 8));
    }

    #[test]
    fn reparameterize_with_zero_noise_returns_mean() {
        let device = Default::default();
        let mu = Tensor::<B, 2>::from_floats([[1.0, -2.0, 0.5, 0.0]], &device);
        let logvar = Tensor::<B, 2>::from_floats([[0.3, -1.0, 2.0, 0.0]], &device);
        let eps = Tensor::<B, 2>::zeros([1, 4], &device);

        let z: Vec<f32> = reparameterize(mu, logvar, eps).to_data().to_vec().unwrap();
        assert_eq!(z, vec![1.0, -2.0, 0.5, 0.0]);
    }

    #[test]
    fn reparameterize_scales_noise_by_std() {
        let device = Default::default();
        let mu = Tensor::<B, 2>::zeros([1, 1], &device);
        // logvar = 2 ln 2, so std = 2.
        let logvar = Tensor::<B, 2>::from_floats([[2.0 * std::f32::consts::LN_2]], &device);
        let eps = Tensor::<B, 2>::from_floats([[3.0]], &device);

        let z: Vec<f32> = reparameterize(mu, logvar, eps).to_data().to_vec().unwrap();
        assert!((z[0] - 6.0).abs() < 1e-5);
    }
}
