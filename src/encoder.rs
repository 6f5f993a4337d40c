use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::pool::{AdaptiveAvgPool2d, AdaptiveAvgPool2dConfig, AvgPool2d, AvgPool2dConfig};
use burn::nn::{
    InstanceNorm, InstanceNormConfig, LeakyRelu, LeakyReluConfig, Linear, LinearConfig,
    PaddingConfig2d,
};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::config::EncoderConfig;

/// Residual downsampling block: two 3x3 convs with instance norm followed by
/// 2x2 average pooling, plus a pooled 1x1 shortcut.
#[derive(Module, Debug)]
pub struct EncoderBlock<B: Backend> {
    conv1: Conv2d<B>,
    norm1: InstanceNorm<B>,
    conv2: Conv2d<B>,
    norm2: InstanceNorm<B>,
    shortcut: Conv2d<B>,
    pool: AvgPool2d,
    lrelu: LeakyRelu,
}

impl<B: Backend> EncoderBlock<B> {
    pub fn new(in_ch: usize, out_ch: usize, device: &B::Device) -> Self {
        Self {
            conv1: Conv2dConfig::new([in_ch, in_ch], [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            norm1: InstanceNormConfig::new(in_ch).init(device),
            conv2: Conv2dConfig::new([in_ch, out_ch], [3, 3])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            norm2: InstanceNormConfig::new(out_ch).init(device),
            shortcut: Conv2dConfig::new([in_ch, out_ch], [1, 1]).init(device),
            pool: AvgPool2dConfig::new([2, 2]).with_strides([2, 2]).init(),
            lrelu: LeakyReluConfig::new().with_negative_slope(0.2).init(),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let h = self.conv1.forward(x.clone());
        let h = self.norm1.forward(h);
        let h = self.lrelu.forward(h);
        let h = self.conv2.forward(h);
        let h = self.norm2.forward(h);
        let h = self.pool.forward(h);

        let s = self.shortcut.forward(self.pool.forward(x));
        h + s
    }
}

/// ResNet encoder with a variational dual head: a 4x4/2 stem conv, a chain
/// of residual downsampling blocks with channel multipliers capped at 4x,
/// global average pooling, then one linear head each for the latent mean and
/// log-variance.
#[derive(Module, Debug)]
pub struct Encoder<B: Backend> {
    stem: Conv2d<B>,
    blocks: Vec<EncoderBlock<B>>,
    lrelu: LeakyRelu,
    pool: AdaptiveAvgPool2d,
    fc_mean: Linear<B>,
    fc_logvar: Linear<B>,
}

impl EncoderConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Encoder<B> {
        let mut blocks = Vec::with_capacity(self.n_blocks - 1);
        for n in 1..self.n_blocks {
            let c_in = self.ndf * n.min(4);
            let c_out = self.ndf * (n + 1).min(4);
            blocks.push(EncoderBlock::new(c_in, c_out, device));
        }
        let feat = self.ndf * self.n_blocks.min(4);

        Encoder {
            stem: Conv2dConfig::new([self.input_nc, self.ndf], [4, 4])
                .with_stride([2, 2])
                .with_padding(PaddingConfig2d::Explicit(1, 1))
                .init(device),
            blocks,
            lrelu: LeakyReluConfig::new().with_negative_slope(0.2).init(),
            pool: AdaptiveAvgPool2dConfig::new([1, 1]).init(),
            fc_mean: LinearConfig::new(feat, self.nz).init(device),
            fc_logvar: LinearConfig::new(feat, self.nz).init(device),
        }
    }
}

impl<B: Backend> Encoder<B> {
    /// Returns `(mu, logvar)`, each of shape [batch, nz].
    pub fn forward(&self, x: Tensor<B, 4>) -> (Tensor<B, 2>, Tensor<B, 2>) {
        let mut h = self.stem.forward(x);
        for block in &self.blocks {
            h = block.forward(h);
        }
        let h = self.lrelu.forward(h);
        let h = self.pool.forward(h);
        let feat: Tensor<B, 2> = h.flatten(1, 3);

        let mu = self.fc_mean.forward(feat.clone());
        let logvar = self.fc_logvar.forward(feat);
        (mu, logvar)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type B = NdArray;

    #[test]
    fn heads_have_latent_shape() {
        let device = Default::default();
        let config = EncoderConfig::new().with_ndf(4);
        let encoder = config.init::<B>(&device);

        let x = Tensor::<B, 4>::random([1, 3, 256, 256], Distribution::Uniform(-1.0, 1.0), &device);
        let (mu, logvar) = encoder.forward(x);
        assert_eq!(mu.dims(), [1, 8]);
        assert_eq!(logvar.dims(), [1, 8]);
    }

    #[test]
    fn block_halves_spatial_extent() {
        let device = Default::default();
        let block = EncoderBlock::<B>::new(4, 8, &device);
        let x = Tensor::<B, 4>::zeros([1, 4, 32, 32], &device);
        assert_eq!(block.forward(x).dims(), [1, 8, 16, 16]);
    }
}
