// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Text detection backends
//!
//! A backend turns a binary image into raw per-token records. The default
//! backend shells out to the `tesseract` CLI and parses its TSV output.

use image::{GrayImage, ImageFormat};
use std::io::Write;
use std::path::PathBuf;
use std::process::Command;
use thiserror::Error;
use tracing::debug;

/// Errors raised by a text-detection backend
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("failed to stage image for detection: {0}")]
    Staging(String),

    #[error("failed to run {binary} (is it installed?): {message}")]
    Spawn { binary: String, message: String },

    #[error("{binary} exited with {status}: {stderr}")]
    Backend {
        binary: String,
        status: String,
        stderr: String,
    },

    #[error("unreadable detector output: {0}")]
    Output(String),
}

/// One token as reported by the detector, before any filtering
#[derive(Debug, Clone, PartialEq)]
pub struct RawToken {
    /// Layout level (1 = page ... 5 = word)
    pub level: u32,
    pub page_num: u32,
    pub block_num: u32,
    pub par_num: u32,
    pub line_num: u32,
    pub word_num: u32,
    pub left: u32,
    pub top: u32,
    pub width: u32,
    pub height: u32,
    /// Confidence 0-100, negative when the row carries no text
    pub confidence: i32,
    /// Raw (untrimmed) text
    pub text: String,
}

/// A text-detection backend
///
/// Implementations must return tokens in their native layout order.
pub trait TextDetector: Send + Sync {
    /// Detect text tokens in a binary image
    fn detect(&self, image: &GrayImage) -> Result<Vec<RawToken>, DetectionError>;

    /// Get the backend name for logging
    fn name(&self) -> &'static str;
}

/// Tesseract CLI backend
#[derive(Debug, Clone)]
pub struct TesseractDetector {
    binary: PathBuf,
    language: String,
    page_segmentation: Option<u32>,
}

impl Default for TesseractDetector {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("tesseract"),
            language: "eng".to_string(),
            page_segmentation: None,
        }
    }
}

impl TesseractDetector {
    /// Create a detector using `tesseract` from `PATH` and English data
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific tesseract executable
    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Use a specific language pack (e.g. "eng+deu")
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    /// Override the page segmentation mode (`--psm`)
    pub fn with_page_segmentation(mut self, psm: u32) -> Self {
        self.page_segmentation = Some(psm);
        self
    }

    fn binary_name(&self) -> String {
        self.binary.display().to_string()
    }

    fn run_tsv(&self, path: &std::path::Path) -> Result<String, DetectionError> {
        let mut command = Command::new(&self.binary);
        command.arg(path).arg("stdout").arg("-l").arg(&self.language);
        if let Some(psm) = self.page_segmentation {
            command.arg("--psm").arg(psm.to_string());
        }
        command.arg("tsv");

        let output = command.output().map_err(|e| DetectionError::Spawn {
            binary: self.binary_name(),
            message: e.to_string(),
        })?;

        if !output.status.success() {
            return Err(DetectionError::Backend {
                binary: self.binary_name(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        String::from_utf8(output.stdout).map_err(|e| DetectionError::Output(e.to_string()))
    }
}

impl TextDetector for TesseractDetector {
    fn detect(&self, image: &GrayImage) -> Result<Vec<RawToken>, DetectionError> {
        let mut staged = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .map_err(|e| DetectionError::Staging(e.to_string()))?;

        image
            .write_to(&mut staged, ImageFormat::Png)
            .map_err(|e| DetectionError::Staging(e.to_string()))?;
        staged
            .flush()
            .map_err(|e| DetectionError::Staging(e.to_string()))?;

        let tsv = self.run_tsv(staged.path())?;
        let tokens = parse_tsv(&tsv)?;
        debug!("{} returned {} tokens", self.name(), tokens.len());
        Ok(tokens)
    }

    fn name(&self) -> &'static str {
        "tesseract"
    }
}

const TSV_COLUMNS: usize = 12;

/// Parse Tesseract TSV output into token records, keeping row order
///
/// The header row is skipped. A row whose text column is missing is kept with
/// empty text. Fractional confidences are truncated toward zero.
pub fn parse_tsv(tsv: &str) -> Result<Vec<RawToken>, DetectionError> {
    let mut tokens = Vec::new();

    for (idx, row) in tsv.lines().enumerate() {
        if idx == 0 || row.trim().is_empty() {
            continue;
        }

        let cols: Vec<&str> = row.splitn(TSV_COLUMNS, '\t').collect();
        if cols.len() < TSV_COLUMNS - 1 {
            return Err(DetectionError::Output(format!(
                "row {} has {} columns, expected {}",
                idx,
                cols.len(),
                TSV_COLUMNS
            )));
        }

        let int = |col: usize| -> Result<u32, DetectionError> {
            cols[col].trim().parse::<u32>().map_err(|_| {
                DetectionError::Output(format!(
                    "row {} column {}: invalid integer '{}'",
                    idx, col, cols[col]
                ))
            })
        };

        let confidence = cols[10]
            .trim()
            .parse::<f32>()
            .map_err(|_| {
                DetectionError::Output(format!(
                    "row {}: invalid confidence '{}'",
                    idx, cols[10]
                ))
            })?
            .trunc() as i32;

        tokens.push(RawToken {
            level: int(0)?,
            page_num: int(1)?,
            block_num: int(2)?,
            par_num: int(3)?,
            line_num: int(4)?,
            word_num: int(5)?,
            left: int(6)?,
            top: int(7)?,
            width: int(8)?,
            height: int(9)?,
            confidence,
            text: cols.get(11).map(|t| t.to_string()).unwrap_or_default(),
        });
    }

    Ok(tokens)
}
