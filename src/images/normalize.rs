//! Centers an image on a square white canvas and re-encodes it as JPEG.

use super::ImageError;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, DynamicImage, Rgba, RgbaImage};
use std::path::{Path, PathBuf};

/// Output width and height in pixels.
pub const CANVAS_SIZE: u32 = 1000;

const JPEG_QUALITY: u8 = 90;

/// Normalizes the file at `path` in place on the blocking pool.
///
/// Returns the size of the rewritten file in bytes. On failure the original
/// file is left untouched.
pub async fn normalize(path: &Path) -> Result<u64, ImageError> {
    let path: PathBuf = path.to_path_buf();
    tokio::task::spawn_blocking(move || normalize_blocking(&path))
        .await
        .map_err(|e| ImageError::Worker(e.to_string()))?
}

/// Synchronous variant of [`normalize`].
pub fn normalize_blocking(path: &Path) -> Result<u64, ImageError> {
    let bytes = std::fs::read(path)?;
    let source = image::load_from_memory(&bytes).map_err(ImageError::Decode)?;

    let encoded = encode_jpeg(center_on_canvas(&source))?;
    std::fs::write(path, &encoded)?;

    Ok(encoded.len() as u64)
}

/// Composites `source` onto an opaque white canvas, offset by
/// floor((canvas - dim) / 2) on each axis. Larger sources are clipped.
fn center_on_canvas(source: &DynamicImage) -> DynamicImage {
    let mut canvas = RgbaImage::from_pixel(CANVAS_SIZE, CANVAS_SIZE, Rgba([255, 255, 255, 255]));
    let top = source.to_rgba8();

    let x = (CANVAS_SIZE as i64 - top.width() as i64).div_euclid(2);
    let y = (CANVAS_SIZE as i64 - top.height() as i64).div_euclid(2);
    imageops::overlay(&mut canvas, &top, x, y);

    DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8())
}

fn encode_jpeg(image: DynamicImage) -> Result<Vec<u8>, ImageError> {
    let mut out = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY);
    image.write_with_encoder(encoder).map_err(ImageError::Encode)?;
    Ok(out)
}
