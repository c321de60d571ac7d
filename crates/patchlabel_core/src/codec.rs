//! Record key encoding and patch image codec.
//!
//! The key layout here is the on-disk schema shared with ingestion tooling:
//! `num-samples` holds the decimal record count and every record `i` owns
//! `image-%09d` and `label-%09d`.

use crate::error::AppError;
use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView, ImageFormat, RgbImage};
use std::io::Cursor;

/// Key holding the decimal record count.
pub const COUNT_KEY: &str = "num-samples";

const IMAGE_KEY_PREFIX: &str = "image-";
const LABEL_KEY_PREFIX: &str = "label-";

/// Key of the compressed image entry for `index`.
pub fn image_key(index: u64) -> String {
    format!("{}{:09}", IMAGE_KEY_PREFIX, index)
}

/// Key of the label entry for `index`.
pub fn label_key(index: u64) -> String {
    format!("{}{:09}", LABEL_KEY_PREFIX, index)
}

/// Both entry keys for `index`, image first.
pub fn record_keys(index: u64) -> (String, String) {
    (image_key(index), label_key(index))
}

/// Encode a record count as stored under [`COUNT_KEY`].
pub fn encode_count(count: u64) -> Vec<u8> {
    count.to_string().into_bytes()
}

/// Decode a stored record count.
///
/// # Returns
/// `None` when the bytes are not UTF-8 decimal text.
pub fn decode_count(bytes: &[u8]) -> Option<u64> {
    std::str::from_utf8(bytes).ok()?.trim().parse().ok()
}

/// Compress a patch for storage (JPEG, alpha dropped).
///
/// # Errors
/// Returns [`AppError::WriteFailed`] when the encoder rejects the image.
pub fn encode_image(image: &DynamicImage) -> Result<Vec<u8>, AppError> {
    let rgb = DynamicImage::ImageRgb8(image.to_rgb8());
    let mut buffer = Cursor::new(Vec::new());
    rgb.write_to(&mut buffer, ImageFormat::Jpeg)
        .map_err(|err| AppError::WriteFailed(format!("image encode failed: {}", err)))?;
    Ok(buffer.into_inner())
}

/// Decode stored patch bytes.
///
/// # Errors
/// Returns [`AppError::DecodeFailed`] for malformed or unsupported data.
pub fn decode_image(bytes: &[u8]) -> Result<DynamicImage, AppError> {
    image::load_from_memory(bytes).map_err(|err| AppError::DecodeFailed(err.to_string()))
}

/// Fit a patch into a `width x height` recognizer input.
///
/// Patches taller than half their width keep their aspect ratio: they are
/// scaled to `height`, left-aligned, and the remaining columns repeat the last
/// scaled column. Wider patches are stretched to the target size.
pub fn normalize_patch(image: &DynamicImage, width: u32, height: u32) -> DynamicImage {
    let (src_width, src_height) = image.dimensions();
    if src_width == 0 || src_height == 0 || width == 0 || height == 0 {
        return DynamicImage::ImageRgb8(RgbImage::new(width, height));
    }

    if f64::from(src_height) <= f64::from(src_width) / 2.0 {
        let stretched = image.resize_exact(width, height, FilterType::CatmullRom);
        return DynamicImage::ImageRgb8(stretched.to_rgb8());
    }

    let ratio = f64::from(src_width) / f64::from(src_height);
    let scaled_width = (f64::from(height) * ratio).ceil() as u32;
    let resized_width = scaled_width.clamp(1, width);
    let resized = image
        .resize_exact(resized_width, height, FilterType::CatmullRom)
        .to_rgb8();

    let mut canvas = RgbImage::new(width, height);
    imageops::replace(&mut canvas, &resized, 0, 0);
    for y in 0..height {
        let edge = *resized.get_pixel(resized_width - 1, y);
        for x in resized_width..width {
            canvas.put_pixel(x, y, edge);
        }
    }
    DynamicImage::ImageRgb8(canvas)
}
