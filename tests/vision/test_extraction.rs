// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use form_schema_extractor::vision::ocr::{extract, filter_tokens, parse_tsv};
use form_schema_extractor::vision::TesseractDetector;
use image::GrayImage;

use super::support::{sample_tokens, ScriptedDetector};

#[test]
fn test_sample_filtering() {
    let regions = filter_tokens(&sample_tokens(), 60);
    let texts: Vec<_> = regions.iter().map(|r| r.text.as_str()).collect();
    assert_eq!(texts, vec!["Patient", "Name:", "Signature"]);
}

#[test]
fn test_every_region_satisfies_invariants() {
    for threshold in [0, 30, 60, 75, 90] {
        for r in filter_tokens(&sample_tokens(), threshold) {
            assert!(r.confidence > threshold);
            assert!(r.width > 5 && r.height > 5);
            assert!(r.text.trim().chars().count() > 1);
            assert_eq!(r.text, r.text.trim());
            assert!(r.bbox[0] < r.bbox[2]);
            assert!(r.bbox[1] < r.bbox[3]);
            assert_eq!(r.bbox[2] - r.bbox[0], r.width);
            assert_eq!(r.bbox[3] - r.bbox[1], r.height);
        }
    }
}

#[test]
fn test_raising_threshold_yields_subset() {
    let tokens = sample_tokens();
    let mut previous = filter_tokens(&tokens, 0);
    for threshold in [30, 50, 60, 75, 90, 100] {
        let current = filter_tokens(&tokens, threshold);
        assert!(current.iter().all(|r| previous.contains(r)), "threshold {}", threshold);
        assert!(current.len() <= previous.len());
        previous = current;
    }
    assert!(previous.is_empty());
}

#[test]
fn test_extract_passes_binary_image_to_backend() {
    let detector = ScriptedDetector::new(sample_tokens());
    let extraction = extract(&GrayImage::new(200, 150), 60, &detector);
    assert_eq!(detector.call_count(), 1);
    assert_eq!(*detector.seen_dimensions.lock().unwrap(), vec![(200, 150)]);
    assert_eq!(extraction.regions.len(), 3);
}

#[test]
fn test_missing_tesseract_yields_empty_result() {
    let detector = TesseractDetector::new().with_binary("/nonexistent/bin/tesseract");
    let extraction = extract(&GrayImage::new(120, 120), 60, &detector);
    assert!(extraction.is_empty());
    assert!(extraction.backend_error.is_some());
}

#[test]
fn test_tsv_to_regions() {
    let tsv = "level\tpage_num\tblock_num\tpar_num\tline_num\tword_num\tleft\ttop\twidth\theight\tconf\ttext\n\
               1\t1\t0\t0\t0\t0\t0\t0\t640\t480\t-1\t\n\
               5\t1\t1\t1\t1\t1\t30\t40\t90\t20\t93.7\tAddress\n\
               5\t1\t1\t1\t2\t1\t30\t80\t90\t20\t59.9\tCity\n";
    let tokens = parse_tsv(tsv).unwrap();
    assert_eq!(tokens.len(), 3);
    let regions = filter_tokens(&tokens, 59);
    assert_eq!(regions.len(), 1);
    assert_eq!(regions[0].text, "Address");
    assert_eq!(regions[0].confidence, 93);
    assert_eq!(regions[0].bbox, [30, 40, 120, 60]);
}
