// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Explicit configuration for the client and the pipeline

pub mod client;
pub mod pipeline;

pub use client::{mask_secret, ClientConfig};
pub use pipeline::{PipelineConfig, RECOMMENDED_THRESHOLD};

use std::env;
use std::path::Path;

/// Variables read by `ClientConfig::from_env` and `PipelineConfig::from_env`
pub const ENV_VARS: &[&str] = &[
    "VISION_LLM_API_URL",
    "VISION_LLM_AUTH_TOKEN",
    "VISION_LLM_API_KEY",
    "API_TIMEOUT",
    "API_MAX_RETRIES",
    "OCR_CONFIDENCE_THRESHOLD",
    "OCR_ENHANCED_PREPROCESSING",
    "TESSERACT_PATH",
    "TESSERACT_LANG",
];

/// Whether each variable currently holds a non-blank value
///
/// # Arguments
/// * `keys` - Variable names, reported in the given order
///
/// # Returns
/// One `(name, is_set)` pair per key. Values are never returned.
pub fn env_status<'a>(keys: &[&'a str]) -> Vec<(&'a str, bool)> {
    keys.iter()
        .map(|&key| (key, env_non_empty(key).is_some()))
        .collect()
}

/// Whether a `.env` file exists in `dir`
pub fn env_file_present(dir: &Path) -> bool {
    dir.join(".env").is_file()
}

/// Read an environment variable, treating blank values as unset
pub(crate) fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Read and parse an environment variable, falling back on absence or parse failure
pub(crate) fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_non_empty(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parse a boolean flag the way `.env` files usually spell it
pub(crate) fn env_flag(key: &str, default: bool) -> bool {
    match env_non_empty(key) {
        Some(v) => !matches!(v.to_lowercase().as_str(), "false" | "0" | "no" | "off"),
        None => default,
    }
}
