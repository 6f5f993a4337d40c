use burn::backend::NdArray;
use image::{Rgb, RgbImage};

use bicyclegan_infer::config::{EncoderConfig, GeneratorConfig};
use bicyclegan_infer::data;
use bicyclegan_infer::sampler::{self, SampleOptions};

type B = NdArray;

/// Black edge half, white photo half, at the smallest spatial size the
/// 8-stage generator accepts.
fn solid_composite() -> RgbImage {
    RgbImage::from_fn(512, 256, |x, _| {
        if x < 256 {
            Rgb([0, 0, 0])
        } else {
            Rgb([255, 255, 255])
        }
    })
}

#[test]
fn end_to_end_produces_36_tiles() {
    let device = Default::default();
    let generator = GeneratorConfig::new().with_ngf(4).init::<B>(&device);
    let encoder = EncoderConfig::new().with_ndf(4).init::<B>(&device);

    let pair = data::split_pair(&solid_composite());
    assert_eq!(pair.edge.dimensions(), (256, 256));
    assert_eq!(pair.reference.dimensions(), (256, 256));

    let x_a = data::to_input_tensor::<B>(&pair.edge, &device);
    let x_b = data::to_reference_tensor::<B>(&pair.reference, &device);

    let options = SampleOptions {
        n_samples: 33,
        encode_seed: Some(7),
        ..Default::default()
    };
    let variants =
        sampler::synthesize(&generator, &encoder, x_a, x_b, &options, &device).unwrap();
    assert_eq!(variants.len(), 34);

    let mut viz = vec![data::edge_to_rgb(&pair.edge), pair.reference.clone()];
    viz.extend(variants);
    assert_eq!(viz.len(), 36);
    for img in &viz {
        assert_eq!(img.dimensions(), (256, 256));
    }

    let tiled = data::tile_images(&viz);
    assert_eq!(tiled.dimensions(), (6 * 256, 6 * 256));
}

/// The encoder path draws unseeded noise by default; its output shape is the
/// contract, not its value.
#[test]
fn unseeded_encoder_path_yields_valid_output() {
    let device = Default::default();
    let generator = GeneratorConfig::new().with_ngf(4).init::<B>(&device);
    let encoder = EncoderConfig::new().with_ndf(4).init::<B>(&device);

    let pair = data::split_pair(&solid_composite());
    let x_a = data::to_input_tensor::<B>(&pair.edge, &device);
    let x_b = data::to_reference_tensor::<B>(&pair.reference, &device);

    let options = SampleOptions {
        n_samples: 0,
        encode_seed: None,
        ..Default::default()
    };
    let variants =
        sampler::synthesize(&generator, &encoder, x_a, x_b, &options, &device).unwrap();
    assert_eq!(variants.len(), 1);
    assert_eq!(variants[0].dimensions(), (256, 256));
}

#[test]
fn saving_into_an_existing_directory_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs").join("infer.png");

    let img = RgbImage::new(4, 4);
    data::save_image(&img, &path).unwrap();
    data::save_image(&img, &path).unwrap();
    assert!(path.exists());
}
