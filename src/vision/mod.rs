// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Vision processing for blank form images
//!
//! This module provides:
//! - Image intake (decoding, size gates, JPEG re-encoding, form identifier)
//! - Normalization and text-region extraction via a detection backend
//! - A review overlay of detected regions
//! - The request payload for the structured-extraction service

pub mod annotate;
pub mod image_utils;
pub mod ocr;
pub mod prompt;

pub use annotate::{annotate, AnnotationStyle};
pub use image_utils::{
    decode_image_bytes, detect_format, encode_jpeg, export_file_name, form_id, ImageError,
    ImageInfo,
};
pub use ocr::{DetectedRegion, Extraction, RawToken, TesseractDetector, TextDetector};
pub use prompt::{build_payload, build_prompt, FormMetadata, RequestPayload};
