// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use form_schema_extractor::vision::image_utils::form_id;
use form_schema_extractor::vision::{AnnotationStyle, TesseractDetector};
use form_schema_extractor::{FormPipeline, PipelineConfig, PipelineError, PipelineWarning};

use super::support::{form_image, png_bytes, sample_tokens, ScriptedDetector};

fn pipeline(detector: ScriptedDetector) -> FormPipeline<ScriptedDetector> {
    FormPipeline::new(detector, PipelineConfig::default(), AnnotationStyle::default())
}

#[test]
fn test_small_image_rejected_before_detection() {
    let detector = ScriptedDetector::new(sample_tokens());
    let pipeline = pipeline(detector.clone());

    let result = pipeline.analyze_bytes(&png_bytes(&form_image(50, 50)));
    assert!(matches!(
        result,
        Err(PipelineError::InvalidImage {
            width: 50,
            height: 50,
            min: 100
        })
    ));
    assert_eq!(detector.call_count(), 0);
}

#[test]
fn test_one_short_side_is_enough_to_reject() {
    let detector = ScriptedDetector::new(sample_tokens());
    let result = pipeline(detector.clone()).prepare(&png_bytes(&form_image(400, 99)));
    assert!(matches!(result, Err(PipelineError::InvalidImage { height: 99, .. })));
    assert_eq!(detector.call_count(), 0);
}

#[test]
fn test_undecodable_bytes() {
    let pipeline = pipeline(ScriptedDetector::default());
    assert!(matches!(pipeline.prepare(&[]), Err(PipelineError::Decode(_))));
    assert!(matches!(
        pipeline.prepare(b"definitely not an image"),
        Err(PipelineError::Decode(_))
    ));
}

#[test]
fn test_form_id_shared_by_metadata_and_payload() {
    let detector = ScriptedDetector::new(sample_tokens());
    let pipeline = pipeline(detector.clone());

    let prepared = pipeline.prepare(&png_bytes(&form_image(200, 150))).unwrap();
    assert_eq!(prepared.form_id, form_id(&prepared.jpeg));
    assert_eq!(prepared.form_id.len(), 64);

    let analysis = pipeline.analyze(&prepared);
    let payload = analysis.payload.as_ref().unwrap();
    assert_eq!(analysis.metadata.form_id, prepared.form_id);
    assert_eq!(payload.form_id(), prepared.form_id);
    assert_eq!(payload.image_jpeg(), prepared.jpeg.as_slice());
    assert!(payload.prompt().contains(&prepared.form_id));
    assert_eq!(
        prepared.export_file_name(),
        format!("form_schema_{}.json", &prepared.form_id[..8])
    );
}

#[test]
fn test_same_bytes_same_identifier() {
    let bytes = png_bytes(&form_image(200, 150));
    let pipeline = pipeline(ScriptedDetector::new(sample_tokens()));
    let a = pipeline.analyze_bytes(&bytes).unwrap();
    let b = pipeline.analyze_bytes(&bytes).unwrap();
    assert_eq!(a.metadata.form_id, b.metadata.form_id);
    assert_eq!(a.payload, b.payload);
}

#[test]
fn test_analysis_contents() {
    let detector = ScriptedDetector::new(sample_tokens());
    let analysis = pipeline(detector.clone())
        .analyze_bytes(&png_bytes(&form_image(200, 150)))
        .unwrap();

    assert_eq!(detector.call_count(), 1);
    assert_eq!(*detector.seen_dimensions.lock().unwrap(), vec![(200, 150)]);
    assert_eq!(analysis.regions.len(), 3);
    assert_eq!(analysis.metadata.num_ocr_entries, 3);
    assert_eq!((analysis.metadata.image_width, analysis.metadata.image_height), (200, 150));
    assert!(analysis.metadata.preprocessing_enabled);
    assert_eq!(analysis.annotated.dimensions(), (200, 150));
    assert!(analysis.warnings.is_empty());
    assert!(!analysis.nothing_detected());
}

#[test]
fn test_oversized_image_is_downscaled_with_warning() {
    let config = PipelineConfig {
        max_pixels: 10_000,
        max_side: 150,
        ..PipelineConfig::default()
    };
    let detector = ScriptedDetector::new(sample_tokens());
    let pipeline = FormPipeline::new(detector.clone(), config, AnnotationStyle::default());

    let analysis = pipeline.analyze_bytes(&png_bytes(&form_image(300, 200))).unwrap();
    assert_eq!(
        analysis.warnings.first(),
        Some(&PipelineWarning::Downscaled {
            from: (300, 200),
            to: (150, 100)
        })
    );
    assert_eq!(analysis.annotated.dimensions(), (150, 100));
    assert_eq!(*detector.seen_dimensions.lock().unwrap(), vec![(150, 100)]);
}

#[test]
fn test_missing_backend_reports_nothing_detected() {
    let config = PipelineConfig {
        tesseract_path: Some("/nonexistent/bin/tesseract".into()),
        ..PipelineConfig::default()
    };
    let detector = config.tesseract_detector();
    let pipeline = FormPipeline::new(detector, config, AnnotationStyle::default());

    let analysis = pipeline.analyze_bytes(&png_bytes(&form_image(200, 150))).unwrap();
    assert!(analysis.regions.is_empty());
    assert!(analysis.payload.is_none());
    assert!(analysis
        .warnings
        .iter()
        .any(|w| matches!(w, PipelineWarning::DetectionFailed(_))));
    assert!(analysis.warnings.contains(&PipelineWarning::NothingDetected));
    assert_eq!(analysis.metadata.num_ocr_entries, 0);
}

#[test]
fn test_unusual_threshold_warns_but_runs() {
    let config = PipelineConfig {
        confidence_threshold: 97,
        enhanced: false,
        ..PipelineConfig::default()
    };
    let pipeline = FormPipeline::new(
        ScriptedDetector::new(sample_tokens()),
        config,
        AnnotationStyle::default(),
    );

    let analysis = pipeline.analyze_bytes(&png_bytes(&form_image(200, 150))).unwrap();
    assert!(analysis
        .warnings
        .contains(&PipelineWarning::ThresholdOutsideRecommended(97)));
    assert!(analysis.warnings.contains(&PipelineWarning::NothingDetected));
    assert!(!analysis.metadata.preprocessing_enabled);
}

#[test]
fn test_pipeline_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<FormPipeline<ScriptedDetector>>();
    assert_send_sync::<FormPipeline<TesseractDetector>>();
}

#[test]
fn test_boxes_only_overlay_is_reported() {
    let pipeline = FormPipeline::new(
        ScriptedDetector::new(sample_tokens()),
        PipelineConfig::default(),
        AnnotationStyle::boxes_only(),
    );

    let analysis = pipeline.analyze_bytes(&png_bytes(&form_image(200, 150))).unwrap();
    assert_eq!(analysis.warnings, vec![PipelineWarning::LabelsUnavailable]);
    assert!(analysis.payload.is_some());
}
