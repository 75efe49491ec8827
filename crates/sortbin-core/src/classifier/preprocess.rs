//! Image preprocessing for the CLIP vision encoder.
//!
//! CLIP ViT-L/14 expects:
//! - Shortest edge resized to 224 (bicubic), then a 224×224 center crop
//! - Pixels scaled to [0, 1] and normalized with the OpenAI CLIP mean/std
//! - Channel order: RGB
//! - Tensor layout: NCHW [batch, channels, height, width]

use image::DynamicImage;
use ndarray::Array4;

/// Number of color channels (RGB).
const CHANNELS: usize = 3;

/// CLIP normalization mean (per-channel, RGB).
const NORM_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];

/// CLIP normalization std (per-channel, RGB).
const NORM_STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

/// Preprocess an image for CLIP inference.
pub fn preprocess(image: &DynamicImage, image_size: u32) -> Array4<f32> {
    let cropped = image.resize_to_fill(
        image_size,
        image_size,
        image::imageops::FilterType::CatmullRom,
    );
    let rgb = cropped.to_rgb8();

    let size = image_size as usize;
    Array4::from_shape_fn((1, CHANNELS, size, size), |(_, c, y, x)| {
        let val = rgb.get_pixel(x as u32, y as u32)[c];
        (val as f32 / 255.0 - NORM_MEAN[c]) / NORM_STD[c]
    })
}
