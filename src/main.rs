use anyhow::Result;
use burn::backend::wgpu::{Wgpu, WgpuDevice};
use clap::Parser;
use std::path::PathBuf;

use bicyclegan_infer::checkpoint;
use bicyclegan_infer::config::{validate_gpu_id, EncoderConfig, GeneratorConfig};
use bicyclegan_infer::data;
use bicyclegan_infer::sampler::{self, SampleOptions};

/// Run a pretrained BicycleGAN generator/encoder pair on one composite
/// edge|photo image and tile the stochastic outputs into a single grid.
#[derive(Parser, Debug)]
#[command(about = "BicycleGAN inference visualizer")]
struct Args {
    /// GPU id
    #[arg(short = 'g', long, default_value_t = 0)]
    gpu: i64,

    /// Composite side-by-side image file (edge half, photo half)
    #[arg(short = 'i', long, default_value = "data/edges2shoes_val_100_AB.jpg")]
    img_file: PathBuf,

    /// E model file
    #[arg(short = 'E', long = "E-model-file", default_value = "data/edges2shoes_net_E")]
    e_model_file: PathBuf,

    /// G model file
    #[arg(short = 'G', long = "G-model-file", default_value = "data/edges2shoes_net_G")]
    g_model_file: PathBuf,

    /// Output file
    #[arg(short = 'o', long, default_value = "logs/infer.png")]
    out_file: PathBuf,

    /// Seed for the encoder-path noise draw; drawn from entropy when omitted
    #[arg(long)]
    encode_seed: Option<u64>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    println!("GPU id: {}", args.gpu);
    println!("G model: {}", args.g_model_file.display());
    println!("E model: {}", args.e_model_file.display());
    println!("Input file: {}", args.img_file.display());

    let gpu = validate_gpu_id(args.gpu)?;

    // Plain (non-autodiff) backend: gradient tracking never exists and
    // dropout is inert, so the whole process runs in inference mode.
    type B = Wgpu<f32, i32>;
    let device = WgpuDevice::DiscreteGpu(gpu);

    let generator =
        checkpoint::load_generator::<B>(&GeneratorConfig::new(), &args.g_model_file, &device)?;
    let encoder =
        checkpoint::load_encoder::<B>(&EncoderConfig::new(), &args.e_model_file, &device)?;

    let pair = data::load_pair(&args.img_file)?;
    let x_a = data::to_input_tensor::<B>(&pair.edge, &device);
    let x_b = data::to_reference_tensor::<B>(&pair.reference, &device);

    let options = SampleOptions {
        encode_seed: args.encode_seed,
        ..Default::default()
    };
    let variants = sampler::synthesize(&generator, &encoder, x_a, x_b, &options, &device)?;

    let mut viz = vec![data::edge_to_rgb(&pair.edge), pair.reference.clone()];
    viz.extend(variants);

    let tiled = data::tile_images(&viz);
    data::save_image(&tiled, &args.out_file)?;
    println!("Saved file: {}", args.out_file.display());

    Ok(())
}
