// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Region extraction: reduce raw detector tokens to filtered text regions

use image::GrayImage;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::detection::{DetectionError, RawToken, TextDetector};

/// Minimum box side (exclusive) for a token to be kept
pub const MIN_BOX_SIDE: u32 = 5;

/// Minimum trimmed text length (exclusive) for a token to be kept
pub const MIN_TEXT_CHARS: usize = 1;

/// A filtered text region with position and confidence
///
/// Invariant: `confidence` exceeds the threshold used, `width` and `height`
/// exceed 5 and the trimmed text has more than one character.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedRegion {
    /// Trimmed text content
    pub text: String,
    /// `[x1, y1, x2, y2]` in pixel coordinates
    pub bbox: [u32; 4],
    /// Confidence score (0-100)
    pub confidence: i32,
    pub line_num: u32,
    pub block_num: u32,
    pub page_num: u32,
    pub width: u32,
    pub height: u32,
}

impl DetectedRegion {
    /// Build a region from a token that passed filtering
    ///
    /// Returns `None` when the box's far corner does not fit in `u32`.
    fn from_token(token: &RawToken, text: &str) -> Option<Self> {
        let x2 = token.left.checked_add(token.width)?;
        let y2 = token.top.checked_add(token.height)?;
        Some(Self {
            text: text.to_string(),
            bbox: [token.left, token.top, x2, y2],
            confidence: token.confidence,
            line_num: token.line_num,
            block_num: token.block_num,
            page_num: token.page_num,
            width: token.width,
            height: token.height,
        })
    }
}

/// Result of running region extraction
#[derive(Debug, Default)]
pub struct Extraction {
    /// Filtered regions in detector order
    pub regions: Vec<DetectedRegion>,
    /// Backend failure, if any; regions are empty when set
    pub backend_error: Option<DetectionError>,
}

impl Extraction {
    /// Whether no regions survived (or the backend failed)
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

/// Apply the token filtering policy, preserving order
///
/// A token is kept only if, in order:
/// 1. its confidence is strictly greater than `threshold`
/// 2. its trimmed text has more than one character
/// 3. its box is wider and taller than 5 pixels
/// 4. its box corners are representable (`left + width` and `top + height` fit in `u32`)
pub fn filter_tokens(tokens: &[RawToken], threshold: i32) -> Vec<DetectedRegion> {
    tokens
        .iter()
        .filter(|token| token.confidence > threshold)
        .filter_map(|token| {
            let text = token.text.trim();
            (text.chars().count() > MIN_TEXT_CHARS).then_some((token, text))
        })
        .filter(|(token, _)| token.width > MIN_BOX_SIDE && token.height > MIN_BOX_SIDE)
        .filter_map(|(token, text)| DetectedRegion::from_token(token, text))
        .collect()
}

/// Run a detection backend over a binary image and filter its output
///
/// Never fails: a backend error yields an empty region list with the error
/// attached to the result.
pub fn extract(binary: &GrayImage, threshold: i32, detector: &dyn TextDetector) -> Extraction {
    match detector.detect(binary) {
        Ok(tokens) => {
            let regions = filter_tokens(&tokens, threshold);
            debug!(
                "Kept {} of {} {} tokens at threshold {}",
                regions.len(),
                tokens.len(),
                detector.name(),
                threshold
            );
            Extraction {
                regions,
                backend_error: None,
            }
        }
        Err(e) => {
            warn!("⚠️ {} detection failed: {}", detector.name(), e);
            Extraction {
                regions: Vec::new(),
                backend_error: Some(e),
            }
        }
    }
}
