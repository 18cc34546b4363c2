// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Review overlay: bounding boxes and confidence labels on the original image

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;
use std::path::Path;
use tracing::{debug, info, warn};

use super::ocr::DetectedRegion;

/// High confidence (> 80)
pub const HIGH_CONFIDENCE_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// Medium confidence (> 70)
pub const MEDIUM_CONFIDENCE_COLOR: Rgb<u8> = Rgb([255, 165, 0]);

/// Everything else
pub const LOW_CONFIDENCE_COLOR: Rgb<u8> = Rgb([255, 0, 0]);

/// Gap between a label's baseline and the box's top edge
pub const LABEL_GAP: i32 = 5;

const SYSTEM_FONT_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/System/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// DejaVu Sans, used when no system font is found
const BUNDLED_FONT: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");

/// Drawing settings for the review overlay
pub struct AnnotationStyle {
    /// Font for confidence labels; labels are skipped when `None`
    pub font: Option<FontVec>,
    /// Label height in pixels
    pub font_scale: f32,
    /// Box outline thickness in pixels
    pub thickness: u32,
}

impl std::fmt::Debug for AnnotationStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnnotationStyle")
            .field("font", &self.font.is_some())
            .field("font_scale", &self.font_scale)
            .field("thickness", &self.thickness)
            .finish()
    }
}

/// Default style labels with the bundled font
impl Default for AnnotationStyle {
    fn default() -> Self {
        Self {
            font: bundled_font(),
            ..Self::boxes_only()
        }
    }
}

impl AnnotationStyle {
    /// Style that draws boxes without confidence labels
    pub fn boxes_only() -> Self {
        Self {
            font: None,
            font_scale: 14.0,
            thickness: 2,
        }
    }

    /// Load the label font from a file
    ///
    /// # Arguments
    /// * `font_path` - TrueType or OpenType font file
    ///
    /// # Returns
    /// * `Ok(AnnotationStyle)` - Default sizes with the loaded font
    /// * `Err(io::Error)` - If the file is unreadable or not a valid font
    pub fn with_font_path(font_path: &Path) -> std::io::Result<Self> {
        let font_data = std::fs::read(font_path)?;
        let font = FontVec::try_from_vec(font_data).map_err(|_| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Failed to parse font file: {}", font_path.display()),
            )
        })?;

        Ok(Self {
            font: Some(font),
            ..Self::boxes_only()
        })
    }

    /// Look for a font in common system locations, falling back to the bundled font
    pub fn with_system_font() -> Self {
        for path in SYSTEM_FONT_PATHS {
            if let Ok(style) = Self::with_font_path(Path::new(path)) {
                info!("Loaded label font: {}", path);
                return style;
            }
        }

        debug!("No system font found, using bundled label font");
        Self::default()
    }

    /// Whether confidence labels will be drawn
    pub fn draws_labels(&self) -> bool {
        self.font.is_some()
    }
}

fn bundled_font() -> Option<FontVec> {
    match FontVec::try_from_vec(BUNDLED_FONT.to_vec()) {
        Ok(font) => Some(font),
        Err(e) => {
            warn!("⚠️ Bundled label font is unreadable, labels disabled: {}", e);
            None
        }
    }
}

/// Colour for a confidence score; first match wins
pub fn confidence_color(confidence: i32) -> Rgb<u8> {
    if confidence > 80 {
        HIGH_CONFIDENCE_COLOR
    } else if confidence > 70 {
        MEDIUM_CONFIDENCE_COLOR
    } else {
        LOW_CONFIDENCE_COLOR
    }
}

/// Label text for a confidence score
pub fn confidence_label(confidence: i32) -> String {
    format!("{}%", confidence)
}

/// Draw one box and one label per region onto a copy of `original`
///
/// The label baseline sits `LABEL_GAP` pixels above the box's top edge.
///
/// # Arguments
/// * `original` - Image the regions were detected on
/// * `regions` - Regions to outline
/// * `style` - Font and stroke settings
///
/// # Returns
/// A new image with the same dimensions as `original`, which is left untouched.
pub fn annotate(
    original: &RgbImage,
    regions: &[DetectedRegion],
    style: &AnnotationStyle,
) -> RgbImage {
    let mut canvas = original.clone();

    for region in regions {
        let color = confidence_color(region.confidence);
        draw_box(&mut canvas, region.bbox, color, style.thickness);

        if let Some(font) = style.font.as_ref() {
            let scale = PxScale::from(style.font_scale);
            let ascent = font.as_scaled(scale).ascent().ceil() as i32;
            let [x1, y1, _, _] = region.bbox;
            draw_text_mut(
                &mut canvas,
                color,
                x1 as i32,
                y1 as i32 - LABEL_GAP - ascent,
                scale,
                font,
                &confidence_label(region.confidence),
            );
        }
    }

    canvas
}

fn draw_box(canvas: &mut RgbImage, bbox: [u32; 4], color: Rgb<u8>, thickness: u32) {
    let [x1, y1, x2, y2] = bbox;
    let width = x2.saturating_sub(x1);
    let height = y2.saturating_sub(y1);

    for inset in 0..thickness.max(1) {
        let w = width.saturating_sub(2 * inset);
        let h = height.saturating_sub(2 * inset);
        if w == 0 || h == 0 {
            break;
        }
        let rect = Rect::at((x1 + inset) as i32, (y1 + inset) as i32).of_size(w, h);
        draw_hollow_rect_mut(canvas, rect, color);
    }
}
