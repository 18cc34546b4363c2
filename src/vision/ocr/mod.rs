// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text detection and region extraction for form images
//!
//! Components:
//! - `preprocessing` - Grayscale + binarization for detection
//! - `detection` - Detection backends (Tesseract CLI)
//! - `extraction` - Token filtering into `DetectedRegion`s

pub mod detection;
pub mod extraction;
pub mod preprocessing;

pub use detection::{parse_tsv, DetectionError, RawToken, TesseractDetector, TextDetector};
pub use extraction::{extract, filter_tokens, DetectedRegion, Extraction};
pub use preprocessing::normalize;
