// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! One-image pipeline: intake, normalization, extraction, overlay, payload

use image::{DynamicImage, RgbImage};
use std::fmt;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{PipelineConfig, RECOMMENDED_THRESHOLD};
use crate::vision::image_utils::{
    self, decode_image_bytes, downscale_if_oversized, encode_jpeg, validate_dimensions, ImageError,
};
use crate::vision::ocr::{extract, normalize, DetectedRegion, TextDetector};
use crate::vision::{annotate, build_payload, AnnotationStyle, FormMetadata, RequestPayload};

/// Errors that stop the pipeline before detection
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Image too small: {width}x{height} (minimum {min}x{min})")]
    InvalidImage { width: u32, height: u32, min: u32 },

    #[error(transparent)]
    Decode(ImageError),

    #[error(transparent)]
    Encode(ImageError),
}

/// Non-fatal conditions reported alongside a result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineWarning {
    Downscaled {
        from: (u32, u32),
        to: (u32, u32),
    },
    DetectionFailed(String),
    NothingDetected,
    ThresholdOutsideRecommended(i32),
    /// The overlay carries boxes only
    LabelsUnavailable,
}

impl fmt::Display for PipelineWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Downscaled { from, to } => write!(
                f,
                "Image resized from {}x{} to {}x{} for processing",
                from.0, from.1, to.0, to.1
            ),
            Self::DetectionFailed(reason) => write!(f, "Text detection failed: {}", reason),
            Self::NothingDetected => write!(
                f,
                "No text detected; try lowering the confidence threshold or using a clearer image"
            ),
            Self::LabelsUnavailable => {
                write!(f, "No label font loaded; the overlay shows boxes without confidence")
            }
            Self::ThresholdOutsideRecommended(t) => write!(
                f,
                "Confidence threshold {} is outside the recommended range {}-{}",
                t,
                RECOMMENDED_THRESHOLD.start(),
                RECOMMENDED_THRESHOLD.end()
            ),
        }
    }
}

/// A decoded, size-checked image with its canonical encoding
#[derive(Debug, Clone)]
pub struct PreparedImage {
    /// Image used for detection and overlay
    pub image: RgbImage,
    /// JPEG bytes that are both sent and hashed
    pub jpeg: Vec<u8>,
    /// Hex SHA-256 of `jpeg`
    pub form_id: String,
    pub warnings: Vec<PipelineWarning>,
}

impl PreparedImage {
    /// Name of the exported schema file for this image
    pub fn export_file_name(&self) -> String {
        image_utils::export_file_name(&self.form_id)
    }
}

/// Everything produced for one image
#[derive(Debug, Clone)]
pub struct FormAnalysis {
    pub metadata: FormMetadata,
    pub regions: Vec<DetectedRegion>,
    /// Review overlay, same size as the prepared image
    pub annotated: RgbImage,
    /// `None` when nothing was detected
    pub payload: Option<RequestPayload>,
    pub warnings: Vec<PipelineWarning>,
}

impl FormAnalysis {
    pub fn nothing_detected(&self) -> bool {
        self.payload.is_none()
    }
}

/// Synchronous pipeline over a detection backend
///
/// Holds no per-image state and can be shared across threads.
pub struct FormPipeline<D: TextDetector> {
    detector: D,
    config: PipelineConfig,
    style: AnnotationStyle,
}

impl<D: TextDetector> FormPipeline<D> {
    /// Create a pipeline
    ///
    /// # Arguments
    /// * `detector` - Backend that turns a normalized image into raw tokens
    /// * `config` - Thresholds, size limits and preprocessing mode
    /// * `style` - How the review overlay is drawn
    pub fn new(detector: D, config: PipelineConfig, style: AnnotationStyle) -> Self {
        info!(
            "Form pipeline ready: backend={}, threshold={}, enhanced={}",
            detector.name(),
            config.confidence_threshold,
            config.enhanced
        );
        Self {
            detector,
            config,
            style,
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Decode, gate, downscale, re-encode and hash raw upload bytes
    ///
    /// # Returns
    /// * `Ok(PreparedImage)` - The image to analyze, with any downscale warning
    /// * `Err(PipelineError)` - If the bytes do not decode, the image is too small,
    ///   or JPEG encoding fails
    pub fn prepare(&self, bytes: &[u8]) -> Result<PreparedImage, PipelineError> {
        let (image, info) = decode_image_bytes(bytes).map_err(PipelineError::Decode)?;
        info!(
            "Decoded {:?} image: {}x{} ({} bytes)",
            info.format, info.width, info.height, info.size_bytes
        );

        validate_dimensions(info.width, info.height, self.config.min_dimension).map_err(|_| {
            PipelineError::InvalidImage {
                width: info.width,
                height: info.height,
                min: self.config.min_dimension,
            }
        })?;

        let mut warnings = Vec::new();
        let downscaled =
            downscale_if_oversized(&image, self.config.max_pixels, self.config.max_side);
        let image = match downscaled {
            Some(resized) => {
                let warning = PipelineWarning::Downscaled {
                    from: image.dimensions(),
                    to: resized.dimensions(),
                };
                warn!("⚠️ {}", warning);
                warnings.push(warning);
                resized
            }
            None => image,
        };

        let jpeg = encode_jpeg(&image, self.config.jpeg_quality).map_err(PipelineError::Encode)?;
        let form_id = image_utils::form_id(&jpeg);

        Ok(PreparedImage {
            image,
            jpeg,
            form_id,
            warnings,
        })
    }

    /// Normalize, extract, annotate and build the payload for a prepared image
    ///
    /// Never fails. Detector failures and empty results surface as warnings,
    /// and `payload` is `None` when no region passed the filter.
    pub fn analyze(&self, prepared: &PreparedImage) -> FormAnalysis {
        let mut warnings = prepared.warnings.clone();
        let threshold = self.config.confidence_threshold;

        if !self.config.threshold_is_recommended() {
            let warning = PipelineWarning::ThresholdOutsideRecommended(threshold);
            warn!("⚠️ {}", warning);
            warnings.push(warning);
        }

        let binary = normalize(
            &DynamicImage::ImageRgb8(prepared.image.clone()),
            self.config.enhanced,
        );
        let extraction = extract(&binary, threshold, &self.detector);

        if let Some(err) = &extraction.backend_error {
            warnings.push(PipelineWarning::DetectionFailed(err.to_string()));
        }

        let regions = extraction.regions;
        if !regions.is_empty() && !self.style.draws_labels() {
            warn!("⚠️ {}", PipelineWarning::LabelsUnavailable);
            warnings.push(PipelineWarning::LabelsUnavailable);
        }
        let annotated = annotate(&prepared.image, &regions, &self.style);
        let (width, height) = prepared.image.dimensions();
        let metadata = FormMetadata::new(
            prepared.form_id.clone(),
            width,
            height,
            &regions,
            threshold,
            self.config.enhanced,
        );

        let payload = if regions.is_empty() {
            warn!("⚠️ {}", PipelineWarning::NothingDetected);
            warnings.push(PipelineWarning::NothingDetected);
            None
        } else {
            info!("Detected {} text regions", regions.len());
            Some(build_payload(&metadata, &regions, prepared.jpeg.clone()))
        };

        FormAnalysis {
            metadata,
            regions,
            annotated,
            payload,
            warnings,
        }
    }

    /// `prepare` followed by `analyze`
    pub fn analyze_bytes(&self, bytes: &[u8]) -> Result<FormAnalysis, PipelineError> {
        let prepared = self.prepare(bytes)?;
        Ok(self.analyze(&prepared))
    }
}
