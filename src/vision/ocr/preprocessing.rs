// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image normalization for text detection
//!
//! Produces an inverted binary image (text = white on black) from any input.

use image::{DynamicImage, GrayImage, Luma};
use imageproc::filter::{gaussian_blur_f32, median_filter};

/// Neighbourhood size for adaptive thresholding
pub const ADAPTIVE_BLOCK_SIZE: u32 = 11;

/// Constant subtracted from the local weighted mean
pub const ADAPTIVE_OFFSET: f32 = 2.0;

/// Global threshold used when enhanced preprocessing is off
pub const GLOBAL_THRESHOLD: u8 = 150;

/// Radius of the median filter used for denoising (3x3 window)
pub const DENOISE_RADIUS: u32 = 1;

const FOREGROUND: Luma<u8> = Luma([255]);
const BACKGROUND: Luma<u8> = Luma([0]);

/// Normalize an image for text detection
///
/// Steps:
/// 1. Convert to single-channel grayscale
/// 2. Enhanced: median denoise, then Gaussian adaptive threshold (block 11, offset 2)
/// 3. Basic: global threshold at 150
///
/// Both branches produce an inverted binary image. The input is never modified.
pub fn normalize(image: &DynamicImage, enhanced: bool) -> GrayImage {
    let gray = image.to_luma8();
    if gray.width() == 0 || gray.height() == 0 {
        return gray;
    }

    if enhanced {
        let denoised = median_filter(&gray, DENOISE_RADIUS, DENOISE_RADIUS);
        adaptive_threshold_inverted(&denoised, ADAPTIVE_BLOCK_SIZE, ADAPTIVE_OFFSET)
    } else {
        global_threshold_inverted(&gray, GLOBAL_THRESHOLD)
    }
}

/// Inverted global threshold: pixels above `threshold` become 0, the rest 255
pub fn global_threshold_inverted(gray: &GrayImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y)[0] > threshold {
            BACKGROUND
        } else {
            FOREGROUND
        }
    })
}

/// Inverted adaptive threshold against a Gaussian-weighted local mean
///
/// A pixel becomes 0 when it is strictly brighter than `mean - offset`, 255 otherwise.
pub fn adaptive_threshold_inverted(gray: &GrayImage, block_size: u32, offset: f32) -> GrayImage {
    let local_mean = gaussian_blur_f32(gray, gaussian_sigma(block_size));

    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        let value = gray.get_pixel(x, y)[0] as f32;
        let threshold = local_mean.get_pixel(x, y)[0] as f32 - offset;
        if value > threshold {
            BACKGROUND
        } else {
            FOREGROUND
        }
    })
}

/// Gaussian sigma matching a square kernel of `block_size` pixels
pub fn gaussian_sigma(block_size: u32) -> f32 {
    0.3 * ((block_size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}
