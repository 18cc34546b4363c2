// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod cli;
pub mod client;
pub mod config;
pub mod pipeline;
pub mod vision;

// Re-export main types
pub use client::{
    AttemptObserver, ClassifiedError, FormSchemaDocument, NoopObserver, SchemaClient,
    ServiceResponse,
};
pub use config::{ClientConfig, PipelineConfig};
pub use pipeline::{FormAnalysis, FormPipeline, PipelineError, PipelineWarning, PreparedImage};
pub use vision::{
    annotate, build_payload, build_prompt, AnnotationStyle, DetectedRegion, FormMetadata,
    RequestPayload, TesseractDetector, TextDetector,
};
