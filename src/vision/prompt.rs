// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Request payload construction for the structured-extraction service

use serde::{Deserialize, Serialize};

use super::ocr::DetectedRegion;

/// Data types the service may assign to a field
pub const FIELD_DATA_TYPES: &[&str] = &[
    "string", "number", "date", "email", "phone", "boolean", "select",
];

const TASK_INSTRUCTIONS: &str = "You are a vision model that extracts a structured form schema from OCR data.

The OCR data below was extracted from a blank form template. Your goal is to:
- Identify the fields a person is expected to fill in (not the labels themselves)
- Provide each field name as it is labeled on the form
- Determine the data type of each field (string, number, date, email, phone, boolean or select)
- Return the exact bounding box of the input area, never the bounding box of the label
- Assign each field to a logical section based on headings, titles or spatial grouping
- Mark required fields and fields that depend on other fields

Guidelines:
- Do NOT return bounding boxes that cover only a label (e.g. 'Patient Name')
- Do NOT include decorative text, titles or instructions
- Do NOT guess values; only infer where input is expected
- Exclude legal disclaimers, boilerplate and footer text
- Look for common form patterns: underlines, boxes, checkboxes, signature lines
- Group related fields logically (Personal Info, Address, Emergency Contact, etc.)";

/// Image-level facts sent alongside the regions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormMetadata {
    /// Content hash of the encoded image
    pub form_id: String,
    pub image_width: u32,
    pub image_height: u32,
    /// Number of regions sent
    pub num_ocr_entries: usize,
    pub confidence_threshold: i32,
    pub preprocessing_enabled: bool,
}

impl FormMetadata {
    /// Collect the metadata for one form
    ///
    /// # Arguments
    /// * `form_id` - Content hash of the transmitted JPEG
    /// * `image_width` / `image_height` - Dimensions of the analyzed image
    /// * `regions` - Regions that passed the filter; only their count is kept
    /// * `confidence_threshold` - Threshold the regions were filtered with
    /// * `preprocessing_enabled` - Whether the enhanced normalization was used
    pub fn new(
        form_id: impl Into<String>,
        image_width: u32,
        image_height: u32,
        regions: &[DetectedRegion],
        confidence_threshold: i32,
        preprocessing_enabled: bool,
    ) -> Self {
        Self {
            form_id: form_id.into(),
            image_width,
            image_height,
            num_ocr_entries: regions.len(),
            confidence_threshold,
            preprocessing_enabled,
        }
    }
}

/// Everything transmitted for one form: instruction text plus image bytes
#[derive(Debug, Clone, PartialEq)]
pub struct RequestPayload {
    form_id: String,
    prompt: String,
    image_jpeg: Vec<u8>,
}

impl RequestPayload {
    /// Identifier of the form this payload describes
    pub fn form_id(&self) -> &str {
        &self.form_id
    }

    /// Instruction text sent as the `prompt` form field
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// JPEG bytes sent as the `image` part
    ///
    /// # Returns
    /// The exact bytes the form identifier was computed from.
    pub fn image_jpeg(&self) -> &[u8] {
        &self.image_jpeg
    }
}

/// Build the instruction text for a form
///
/// Deterministic: the same metadata and regions always produce the same text.
/// Metadata and regions are embedded verbatim as pretty-printed JSON.
///
/// # Arguments
/// * `metadata` - Image-level facts; its `form_id` also fills the response shape
/// * `regions` - Filtered regions in detection order
pub fn build_prompt(metadata: &FormMetadata, regions: &[DetectedRegion]) -> String {
    format!(
        "{instructions}

Form Metadata:
{metadata}

OCR Results ({count} items):
{regions}

{shape}
",
        instructions = TASK_INSTRUCTIONS,
        metadata = to_pretty_json(metadata),
        count = regions.len(),
        regions = to_pretty_json(&regions),
        shape = response_shape(&metadata.form_id),
    )
}

/// Build the full payload for a form
///
/// # Arguments
/// * `metadata` - Metadata the prompt is built from
/// * `regions` - Regions embedded in the prompt
/// * `image_jpeg` - Canonical JPEG encoding of the analyzed image
///
/// # Returns
/// An immutable payload; retries resend it unchanged.
pub fn build_payload(
    metadata: &FormMetadata,
    regions: &[DetectedRegion],
    image_jpeg: Vec<u8>,
) -> RequestPayload {
    RequestPayload {
        form_id: metadata.form_id.clone(),
        prompt: build_prompt(metadata, regions),
        image_jpeg,
    }
}

/// Literal description of the JSON object the service must return
pub fn response_shape(form_id: &str) -> String {
    format!(
        r#"Return your output as a JSON object with this structure:
{{
  "form_schema": {{
    "form_id": "{form_id}",
    "sections": [
      {{
        "section_name": "string",
        "fields": [
          {{
            "field_name": "string",
            "data_type": "{data_types}",
            "bounding_box": [x1, y1, x2, y2],
            "required": boolean,
            "validation_rules": "string (optional)",
            "placeholder": "string (optional)"
          }}
        ]
      }}
    ]
  }}
}}"#,
        form_id = form_id,
        data_types = FIELD_DATA_TYPES.join("|"),
    )
}

// Serializing plain structs with string keys cannot fail.
fn to_pretty_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_default()
}
