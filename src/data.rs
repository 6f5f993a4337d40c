use anyhow::{anyhow, ensure, Context, Result};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use image::{GrayImage, Luma, Rgb, RgbImage};
use std::path::Path;

/// Maps an 8-bit pixel into the model range [-1, 1].
pub fn pixel_to_float(v: u8) -> f32 {
    v as f32 / 255.0 * 2.0 - 1.0
}

/// Inverse of [`pixel_to_float`]: round, then clip to the 8-bit range.
pub fn float_to_pixel(x: f32) -> u8 {
    ((x + 1.0) / 2.0 * 255.0).round().clamp(0.0, 255.0) as u8
}

/// The two halves of one composite side-by-side image: the single-channel
/// edge domain on the left and the photo reference domain on the right.
pub struct ImagePair {
    pub edge: GrayImage,
    pub reference: RgbImage,
}

pub fn load_pair(path: &Path) -> Result<ImagePair> {
    let img = image::open(path)
        .with_context(|| format!("failed to read image {}", path.display()))?
        .to_rgb8();
    Ok(split_pair(&img))
}

/// Splits at `width / 2` (integer division), so an odd-width composite gives
/// the reference half one extra column. Only channel 0 of the left half is
/// kept; the edge images are grayscale replicated across channels on disk.
pub fn split_pair(img: &RgbImage) -> ImagePair {
    let (width, height) = img.dimensions();
    let half = width / 2;

    let edge = GrayImage::from_fn(half, height, |x, y| Luma([img.get_pixel(x, y)[0]]));
    let reference =
        RgbImage::from_fn(width - half, height, |x, y| *img.get_pixel(x + half, y));

    ImagePair { edge, reference }
}

/// [1, 1, H, W] edge tensor, normalized to [-1, 1].
pub fn to_input_tensor<B: Backend>(edge: &GrayImage, device: &B::Device) -> Tensor<B, 4> {
    let (width, height) = edge.dimensions();
    let data: Vec<f32> = edge.pixels().map(|p| pixel_to_float(p[0])).collect();
    Tensor::<B, 1>::from_floats(data.as_slice(), device).reshape([
        1,
        1,
        height as usize,
        width as usize,
    ])
}

/// [1, 3, H, W] reference tensor: channel-separated, normalized, batch axis
/// of 1.
pub fn to_reference_tensor<B: Backend>(reference: &RgbImage, device: &B::Device) -> Tensor<B, 4> {
    let (width, height) = reference.dimensions();
    let mut data = vec![Vec::with_capacity((width * height) as usize); 3];
    for p in reference.pixels() {
        data[0].push(pixel_to_float(p[0]));
        data[1].push(pixel_to_float(p[1]));
        data[2].push(pixel_to_float(p[2]));
    }

    let flat: Vec<f32> = data.into_iter().flatten().collect();
    Tensor::<B, 1>::from_floats(flat.as_slice(), device).reshape([
        1,
        3,
        height as usize,
        width as usize,
    ])
}

/// Inverse of the ingestion mapping: drop the batch axis, reorder CHW back
/// to HWC, denormalize to 8-bit.
pub fn tensor_to_image<B: Backend>(tensor: Tensor<B, 4>) -> Result<RgbImage> {
    let [_, channels, height, width] = tensor.dims();
    ensure!(channels == 3, "expected 3 output channels, got {channels}");

    let values: Vec<f32> = tensor
        .to_data()
        .to_vec()
        .map_err(|e| anyhow!("failed to read tensor data: {e:?}"))?;

    let plane = height * width;
    let img = RgbImage::from_fn(width as u32, height as u32, |x, y| {
        let idx = y as usize * width + x as usize;
        Rgb([
            float_to_pixel(values[idx]),
            float_to_pixel(values[plane + idx]),
            float_to_pixel(values[2 * plane + idx]),
        ])
    });
    Ok(img)
}

/// Replicates the single edge channel to three for display alongside the
/// generated samples.
pub fn edge_to_rgb(edge: &GrayImage) -> RgbImage {
    RgbImage::from_fn(edge.width(), edge.height(), |x, y| {
        let v = edge.get_pixel(x, y)[0];
        Rgb([v, v, v])
    })
}

/// Arranges the images left-to-right, top-to-bottom into a near-square grid
/// (`cols = ceil(sqrt(n))`). Cell size is the maximum image size, with black
/// fill where an image is smaller or a cell is unused.
pub fn tile_images(images: &[RgbImage]) -> RgbImage {
    if images.is_empty() {
        return RgbImage::new(0, 0);
    }

    let (cols, rows) = tile_shape(images.len());
    let cell_w = images.iter().map(|i| i.width()).max().unwrap_or(0);
    let cell_h = images.iter().map(|i| i.height()).max().unwrap_or(0);

    let mut canvas = RgbImage::new(cols * cell_w, rows * cell_h);
    for (idx, img) in images.iter().enumerate() {
        let cx = (idx as u32 % cols) * cell_w;
        let cy = (idx as u32 / cols) * cell_h;
        image::imageops::replace(&mut canvas, img, cx as i64, cy as i64);
    }
    canvas
}

pub fn tile_shape(count: usize) -> (u32, u32) {
    let cols = (count as f64).sqrt().ceil() as u32;
    let rows = (count as u32).div_ceil(cols);
    (cols, rows)
}

/// Writes the image, creating parent directories first. `create_dir_all` is
/// idempotent; only genuinely-new failures (permissions and the like)
/// propagate.
pub fn save_image(img: &RgbImage, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
    }
    img.save(path)
        .with_context(|| format!("failed to write image {}", path.display()))?;
    Ok(())
}
