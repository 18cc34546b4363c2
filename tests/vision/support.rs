// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Shared fixtures for vision tests

use form_schema_extractor::vision::ocr::DetectionError;
use form_schema_extractor::vision::{RawToken, TextDetector};
use image::{DynamicImage, GrayImage, ImageFormat, Rgb, RgbImage};
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn token(
    text: &str,
    confidence: i32,
    left: u32,
    top: u32,
    width: u32,
    height: u32,
) -> RawToken {
    RawToken {
        level: 5,
        page_num: 1,
        block_num: 1,
        par_num: 1,
        line_num: 1,
        word_num: 1,
        left,
        top,
        width,
        height,
        confidence,
        text: text.to_string(),
    }
}

/// A plain form-like image: white page with a few dark bars
pub fn form_image(width: u32, height: u32) -> RgbImage {
    let mut img = RgbImage::from_pixel(width, height, Rgb([255, 255, 255]));
    for row in 0..3u32 {
        let y0 = 20 + row * 30;
        for y in y0..(y0 + 4).min(height) {
            for x in 20..(width.saturating_sub(20)) {
                img.put_pixel(x, y, Rgb([20, 20, 20]));
            }
        }
    }
    img
}

pub fn png_bytes(img: &RgbImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(img.clone())
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

/// Detector that replays fixed tokens and records every call
#[derive(Clone, Default)]
pub struct ScriptedDetector {
    tokens: Vec<RawToken>,
    pub calls: Arc<AtomicUsize>,
    pub seen_dimensions: Arc<Mutex<Vec<(u32, u32)>>>,
}

impl ScriptedDetector {
    pub fn new(tokens: Vec<RawToken>) -> Self {
        Self {
            tokens,
            ..Self::default()
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextDetector for ScriptedDetector {
    fn detect(&self, image: &GrayImage) -> Result<Vec<RawToken>, DetectionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.seen_dimensions.lock().unwrap().push(image.dimensions());
        Ok(self.tokens.clone())
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

pub fn sample_tokens() -> Vec<RawToken> {
    vec![
        token("", -1, 0, 0, 200, 150),
        token("Patient", 96, 20, 8, 60, 14),
        token("Name:", 91, 90, 8, 40, 14),
        token("|", 88, 140, 8, 6, 14),
        token("Date", 45, 20, 40, 30, 14),
        token("Signature", 74, 20, 70, 70, 14),
        token("Phone", 82, 20, 100, 40, 3),
    ]
}
