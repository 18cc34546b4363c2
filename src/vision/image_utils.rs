// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image intake: decoding, size gates, JPEG re-encoding and the form identifier

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, RgbImage};
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Maximum encoded upload size (50MB)
pub const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

/// Smallest accepted width or height in pixels
pub const MIN_DIMENSION: u32 = 100;

/// Pixel-count ceiling above which the image is downscaled (~50MP)
pub const MAX_PIXELS: u64 = 50_000_000;

/// Longest side after downscaling an oversized image
pub const MAX_SIDE: u32 = 3000;

/// JPEG quality used for the transmitted (and hashed) image
pub const JPEG_QUALITY: u8 = 95;

/// Custom error types for image intake
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Image data is too large: {0} bytes (max: {1} bytes)")]
    TooLarge(usize, usize),

    #[error("Unsupported image format")]
    UnsupportedFormat,

    #[error("Failed to decode image: {0}")]
    DecodeFailed(String),

    #[error("Failed to encode image as JPEG: {0}")]
    EncodeFailed(String),

    #[error("Image data is empty")]
    EmptyData,

    #[error("Image too small: {width}x{height} (minimum {min}x{min})")]
    TooSmall { width: u32, height: u32, min: u32 },
}

/// Image information extracted during loading
#[derive(Debug, Clone)]
pub struct ImageInfo {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Detected format
    pub format: ImageFormat,
    /// Size in bytes
    pub size_bytes: usize,
}

/// Decode raw upload bytes into an RGB image
///
/// # Returns
/// * `Ok((RgbImage, ImageInfo))` - The decoded image and metadata
/// * `Err(ImageError)` - If the data is empty, too large or not a supported raster
pub fn decode_image_bytes(bytes: &[u8]) -> Result<(RgbImage, ImageInfo), ImageError> {
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(ImageError::TooLarge(bytes.len(), MAX_UPLOAD_BYTES));
    }

    if bytes.is_empty() {
        return Err(ImageError::EmptyData);
    }

    let format = detect_format(bytes)?;

    let img = image::load_from_memory_with_format(bytes, format)
        .map_err(|e| ImageError::DecodeFailed(e.to_string()))?;

    let info = ImageInfo {
        width: img.width(),
        height: img.height(),
        format,
        size_bytes: bytes.len(),
    };

    Ok((img.to_rgb8(), info))
}

/// Detect image format from magic bytes
pub fn detect_format(bytes: &[u8]) -> Result<ImageFormat, ImageError> {
    if bytes.len() < 4 {
        return Err(ImageError::UnsupportedFormat);
    }

    match bytes {
        // PNG: 89 50 4E 47 (0x89 P N G)
        [0x89, 0x50, 0x4E, 0x47, ..] => Ok(ImageFormat::Png),

        // JPEG: FF D8 FF
        [0xFF, 0xD8, 0xFF, ..] => Ok(ImageFormat::Jpeg),

        // WebP: RIFF .... WEBP
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Ok(ImageFormat::WebP),

        // GIF: GIF87a or GIF89a
        [0x47, 0x49, 0x46, 0x38, x, ..] if *x == 0x37 || *x == 0x39 => Ok(ImageFormat::Gif),

        // BMP: BM
        [0x42, 0x4D, ..] => Ok(ImageFormat::Bmp),

        // TIFF: II (little-endian) or MM (big-endian)
        [0x49, 0x49, 0x2A, 0x00, ..] | [0x4D, 0x4D, 0x00, 0x2A, ..] => Ok(ImageFormat::Tiff),

        _ => Err(ImageError::UnsupportedFormat),
    }
}

/// Reject images with either side below `min`
///
/// # Returns
/// * `Ok(())` - Both sides are at least `min`
/// * `Err(ImageError::TooSmall)` - Otherwise
pub fn validate_dimensions(width: u32, height: u32, min: u32) -> Result<(), ImageError> {
    if width < min || height < min {
        return Err(ImageError::TooSmall { width, height, min });
    }
    Ok(())
}

/// Downscale an image whose pixel count exceeds `max_pixels`
///
/// The aspect ratio is preserved and the longest side is capped at `max_side`.
///
/// # Arguments
/// * `image` - Decoded image
/// * `max_pixels` - Pixel-count ceiling
/// * `max_side` - Longest side of the result
///
/// # Returns
/// * `Some(RgbImage)` - The resized image (Lanczos3)
/// * `None` - If the image is within the ceiling
pub fn downscale_if_oversized(
    image: &RgbImage,
    max_pixels: u64,
    max_side: u32,
) -> Option<RgbImage> {
    let (width, height) = image.dimensions();
    if (width as u64) * (height as u64) <= max_pixels {
        return None;
    }

    let resized = DynamicImage::ImageRgb8(image.clone()).resize(
        max_side,
        max_side,
        FilterType::Lanczos3,
    );
    Some(resized.to_rgb8())
}

/// Encode an RGB image as JPEG at the given quality
///
/// # Arguments
/// * `image` - Image to encode
/// * `quality` - JPEG quality, 1 to 100
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, ImageError> {
    let mut buffer = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buffer, quality);
    encoder
        .encode_image(image)
        .map_err(|e| ImageError::EncodeFailed(e.to_string()))?;
    Ok(buffer)
}

/// Content hash of the encoded image, used as the form identifier
///
/// Lowercase hex SHA-256 of exactly the bytes that are transmitted.
///
/// # Returns
/// A 64-character hex string.
pub fn form_id(encoded: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(encoded);
    hex::encode(hasher.finalize())
}

/// File name for an exported schema, keyed by the form identifier
pub fn export_file_name(form_id: &str) -> String {
    let prefix: String = form_id.chars().take(8).collect();
    format!("form_schema_{}.json", prefix)
}
