// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Configuration for image intake, normalization and extraction

use std::ops::RangeInclusive;
use std::path::PathBuf;

use super::{env_flag, env_non_empty, env_parse};
use crate::vision::image_utils::{JPEG_QUALITY, MAX_PIXELS, MAX_SIDE, MIN_DIMENSION};
use crate::vision::TesseractDetector;

/// Threshold range that gives usable results on typical forms
pub const RECOMMENDED_THRESHOLD: RangeInclusive<i32> = 30..=90;

pub const DEFAULT_CONFIDENCE_THRESHOLD: i32 = 60;

/// Settings for one pipeline instance
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    /// Regions must score strictly above this
    pub confidence_threshold: i32,
    /// Denoise plus adaptive threshold instead of a global threshold
    pub enhanced: bool,
    /// Smallest accepted width or height
    pub min_dimension: u32,
    /// Pixel count above which the image is downscaled
    pub max_pixels: u64,
    /// Longest side after downscaling
    pub max_side: u32,
    pub jpeg_quality: u8,
    /// Tesseract executable; `PATH` lookup when `None`
    pub tesseract_path: Option<PathBuf>,
    pub tesseract_lang: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            enhanced: true,
            min_dimension: MIN_DIMENSION,
            max_pixels: MAX_PIXELS,
            max_side: MAX_SIDE,
            jpeg_quality: JPEG_QUALITY,
            tesseract_path: None,
            tesseract_lang: "eng".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            confidence_threshold: env_parse(
                "OCR_CONFIDENCE_THRESHOLD",
                DEFAULT_CONFIDENCE_THRESHOLD,
            ),
            enhanced: env_flag("OCR_ENHANCED_PREPROCESSING", true),
            tesseract_path: env_non_empty("TESSERACT_PATH").map(PathBuf::from),
            tesseract_lang: env_non_empty("TESSERACT_LANG")
                .unwrap_or_else(|| defaults.tesseract_lang.clone()),
            ..defaults
        }
    }

    /// Whether the threshold sits inside the recommended range
    pub fn threshold_is_recommended(&self) -> bool {
        RECOMMENDED_THRESHOLD.contains(&self.confidence_threshold)
    }

    /// Build the Tesseract backend these settings describe
    pub fn tesseract_detector(&self) -> TesseractDetector {
        let detector = TesseractDetector::new().with_language(self.tesseract_lang.clone());
        match &self.tesseract_path {
            Some(path) => detector.with_binary(path.clone()),
            None => detector,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !(0..=100).contains(&self.confidence_threshold) {
            return Err(format!(
                "Confidence threshold must be between 0 and 100, got {}",
                self.confidence_threshold
            ));
        }
        if self.min_dimension == 0 {
            return Err("Minimum dimension must be greater than 0".to_string());
        }
        if self.max_side < self.min_dimension {
            return Err("Maximum side must not be smaller than the minimum dimension".to_string());
        }
        if self.max_pixels == 0 {
            return Err("Maximum pixel count must be greater than 0".to_string());
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(format!(
                "JPEG quality must be between 1 and 100, got {}",
                self.jpeg_quality
            ));
        }
        if self.tesseract_lang.trim().is_empty() {
            return Err("Tesseract language must not be empty".to_string());
        }
        Ok(())
    }
}
