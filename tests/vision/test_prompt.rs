// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use form_schema_extractor::vision::ocr::filter_tokens;
use form_schema_extractor::vision::{build_payload, build_prompt, FormMetadata};

use super::support::sample_tokens;

#[test]
fn test_prompt_lists_every_region() {
    let regions = filter_tokens(&sample_tokens(), 60);
    let metadata = FormMetadata::new("f00dbabe", 200, 150, &regions, 60, true);
    let prompt = build_prompt(&metadata, &regions);

    assert!(prompt.contains("OCR Results (3 items):"));
    for region in &regions {
        assert!(prompt.contains(&format!("\"text\": \"{}\"", region.text)));
    }
    assert!(prompt.contains("\"num_ocr_entries\": 3"));
    assert!(prompt.contains("\"form_id\": \"f00dbabe\""));
}

#[test]
fn test_payload_is_deterministic() {
    let regions = filter_tokens(&sample_tokens(), 60);
    let metadata = FormMetadata::new("f00dbabe", 200, 150, &regions, 60, true);
    let a = build_payload(&metadata, &regions, vec![1, 2, 3]);
    let b = build_payload(&metadata, &regions, vec![1, 2, 3]);
    assert_eq!(a, b);
    assert_eq!(a.form_id(), metadata.form_id);
}

#[test]
fn test_threshold_changes_prompt() {
    let tokens = sample_tokens();
    let low = filter_tokens(&tokens, 30);
    let high = filter_tokens(&tokens, 90);
    let p_low = build_prompt(&FormMetadata::new("id", 200, 150, &low, 30, true), &low);
    let p_high = build_prompt(&FormMetadata::new("id", 200, 150, &high, 90, true), &high);
    assert_ne!(p_low, p_high);
    assert!(p_high.contains("OCR Results (2 items):"));
}
