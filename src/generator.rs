use burn::module::Module;
use burn::nn::conv::{Conv2d, Conv2dConfig, ConvTranspose2d, ConvTranspose2dConfig};
use burn::nn::{
    Dropout, DropoutConfig, InstanceNorm, InstanceNormConfig, LeakyRelu, LeakyReluConfig,
    PaddingConfig2d,
};
use burn::tensor::activation;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use crate::config::GeneratorConfig;

fn down_conv<B: Backend>(in_ch: usize, out_ch: usize, device: &B::Device) -> Conv2d<B> {
    Conv2dConfig::new([in_ch, out_ch], [4, 4])
        .with_stride([2, 2])
        .with_padding(PaddingConfig2d::Explicit(1, 1))
        .init(device)
}

fn up_conv<B: Backend>(in_ch: usize, out_ch: usize, device: &B::Device) -> ConvTranspose2d<B> {
    ConvTranspose2dConfig::new([in_ch, out_ch], [4, 4])
        .with_stride([2, 2])
        .with_padding([1, 1])
        .init(device)
}

/// U-Net generator with the latent code injected at every downsampling
/// stage: z is replicated spatially and concatenated to the input of each
/// down conv. Eight down stages, so input height and width must be divisible
/// by 256. Instance norm everywhere except the outermost and innermost
/// convs, leaky-relu on the way down, relu on the way up, tanh output.
#[derive(Module, Debug)]
pub struct Generator<B: Backend> {
    down1: Conv2d<B>,
    down2: Conv2d<B>,
    down3: Conv2d<B>,
    down4: Conv2d<B>,
    down5: Conv2d<B>,
    down6: Conv2d<B>,
    down7: Conv2d<B>,
    down8: Conv2d<B>,

    norm_d2: InstanceNorm<B>,
    norm_d3: InstanceNorm<B>,
    norm_d4: InstanceNorm<B>,
    norm_d5: InstanceNorm<B>,
    norm_d6: InstanceNorm<B>,
    norm_d7: InstanceNorm<B>,

    up8: ConvTranspose2d<B>,
    up7: ConvTranspose2d<B>,
    up6: ConvTranspose2d<B>,
    up5: ConvTranspose2d<B>,
    up4: ConvTranspose2d<B>,
    up3: ConvTranspose2d<B>,
    up2: ConvTranspose2d<B>,
    up1: ConvTranspose2d<B>,

    norm_u8: InstanceNorm<B>,
    norm_u7: InstanceNorm<B>,
    norm_u6: InstanceNorm<B>,
    norm_u5: InstanceNorm<B>,
    norm_u4: InstanceNorm<B>,
    norm_u3: InstanceNorm<B>,
    norm_u2: InstanceNorm<B>,

    drop7: Dropout,
    drop6: Dropout,
    drop5: Dropout,

    lrelu: LeakyRelu,
    nz: usize,
}

impl GeneratorConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Generator<B> {
        let nz = self.nz;
        let c1 = self.ngf;
        let c2 = self.ngf * 2;
        let c3 = self.ngf * 4;
        let c8 = self.ngf * 8;
        let drop_prob = if self.use_dropout { 0.5 } else { 0.0 };

        Generator {
            down1: down_conv(self.input_nc + nz, c1, device),
            down2: down_conv(c1 + nz, c2, device),
            down3: down_conv(c2 + nz, c3, device),
            down4: down_conv(c3 + nz, c8, device),
            down5: down_conv(c8 + nz, c8, device),
            down6: down_conv(c8 + nz, c8, device),
            down7: down_conv(c8 + nz, c8, device),
            down8: down_conv(c8 + nz, c8, device),

            norm_d2: InstanceNormConfig::new(c2).init(device),
            norm_d3: InstanceNormConfig::new(c3).init(device),
            norm_d4: InstanceNormConfig::new(c8).init(device),
            norm_d5: InstanceNormConfig::new(c8).init(device),
            norm_d6: InstanceNormConfig::new(c8).init(device),
            norm_d7: InstanceNormConfig::new(c8).init(device),

            up8: up_conv(c8, c8, device),
            up7: up_conv(c8 * 2, c8, device),
            up6: up_conv(c8 * 2, c8, device),
            up5: up_conv(c8 * 2, c8, device),
            up4: up_conv(c8 * 2, c3, device),
            up3: up_conv(c3 * 2, c2, device),
            up2: up_conv(c2 * 2, c1, device),
            up1: up_conv(c1 * 2, self.output_nc, device),

            norm_u8: InstanceNormConfig::new(c8).init(device),
            norm_u7: InstanceNormConfig::new(c8).init(device),
            norm_u6: InstanceNormConfig::new(c8).init(device),
            norm_u5: InstanceNormConfig::new(c8).init(device),
            norm_u4: InstanceNormConfig::new(c3).init(device),
            norm_u3: InstanceNormConfig::new(c2).init(device),
            norm_u2: InstanceNormConfig::new(c1).init(device),

            drop7: DropoutConfig::new(drop_prob).init(),
            drop6: DropoutConfig::new(drop_prob).init(),
            drop5: DropoutConfig::new(drop_prob).init(),

            lrelu: LeakyReluConfig::new().with_negative_slope(0.2).init(),
            nz,
        }
    }
}

impl<B: Backend> Generator<B> {
    pub fn nz(&self) -> usize {
        self.nz
    }

    /// Concatenate z, replicated over the spatial extent, onto x.
    fn with_z(&self, x: Tensor<B, 4>, z: &Tensor<B, 2>) -> Tensor<B, 4> {
        let [batch, _, height, width] = x.dims();
        let z_spread = z
            .clone()
            .reshape([batch, self.nz, 1, 1])
            .repeat_dim(2, height)
            .repeat_dim(3, width);
        Tensor::cat(vec![x, z_spread], 1)
    }

    /// `x` is the [1, input_nc, H, W] edge tensor, `z` the [1, nz] latent
    /// code. Returns a [1, output_nc, H, W] tensor in [-1, 1].
    pub fn forward(&self, x: Tensor<B, 4>, z: Tensor<B, 2>) -> Tensor<B, 4> {
        let h1 = self.down1.forward(self.with_z(x, &z));
        let h2 = self
            .norm_d2
            .forward(self.down2.forward(self.with_z(self.lrelu.forward(h1.clone()), &z)));
        let h3 = self
            .norm_d3
            .forward(self.down3.forward(self.with_z(self.lrelu.forward(h2.clone()), &z)));
        let h4 = self
            .norm_d4
            .forward(self.down4.forward(self.with_z(self.lrelu.forward(h3.clone()), &z)));
        let h5 = self
            .norm_d5
            .forward(self.down5.forward(self.with_z(self.lrelu.forward(h4.clone()), &z)));
        let h6 = self
            .norm_d6
            .forward(self.down6.forward(self.with_z(self.lrelu.forward(h5.clone()), &z)));
        let h7 = self
            .norm_d7
            .forward(self.down7.forward(self.with_z(self.lrelu.forward(h6.clone()), &z)));
        let h8 = self
            .down8
            .forward(self.with_z(self.lrelu.forward(h7.clone()), &z));

        let u = self.norm_u8.forward(self.up8.forward(activation::relu(h8)));
        let u = self.drop7.forward(
            self.norm_u7
                .forward(self.up7.forward(activation::relu(Tensor::cat(vec![u, h7], 1)))),
        );
        let u = self.drop6.forward(
            self.norm_u6
                .forward(self.up6.forward(activation::relu(Tensor::cat(vec![u, h6], 1)))),
        );
        let u = self.drop5.forward(
            self.norm_u5
                .forward(self.up5.forward(activation::relu(Tensor::cat(vec![u, h5], 1)))),
        );
        let u = self
            .norm_u4
            .forward(self.up4.forward(activation::relu(Tensor::cat(vec![u, h4], 1))));
        let u = self
            .norm_u3
            .forward(self.up3.forward(activation::relu(Tensor::cat(vec![u, h3], 1))));
        let u = self
            .norm_u2
            .forward(self.up2.forward(activation::relu(Tensor::cat(vec![u, h2], 1))));
        let u = self
            .up1
            .forward(activation::relu(Tensor::cat(vec![u, h1], 1)));

        activation::tanh(u)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;
    use burn::tensor::Distribution;

    type B = NdArray;

    #[test]
    fn output_matches_input_spatial_dims() {
        let device = Default::default();
        let config = GeneratorConfig::new().with_ngf(4);
        let generator = config.init::<B>(&device);

        let x = Tensor::<B, 4>::zeros([1, 1, 256, 256], &device);
        let z = Tensor::<B, 2>::random([1, 8], Distribution::Normal(0.0, 1.0), &device);

        let y = generator.forward(x, z);
        assert_eq!(y.dims(), [1, 3, 256, 256]);
    }

    #[test]
    fn output_is_within_tanh_range() {
        let device = Default::default();
        let config = GeneratorConfig::new().with_ngf(4);
        let generator = config.init::<B>(&device);

        let x = Tensor::<B, 4>::random([1, 1, 256, 256], Distribution::Uniform(-1.0, 1.0), &device);
        let z = Tensor::<B, 2>::zeros([1, 8], &device);

        let values: Vec<f32> = generator.forward(x, z).to_data().to_vec().unwrap();
        assert!(values.iter().all(|v| (-1.0..=1.0).contains(v)));
    }
}
