// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{anyhow, bail, Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use crate::client::{SchemaClient, ServiceResponse};
use crate::config::{ClientConfig, PipelineConfig};
use crate::pipeline::{FormAnalysis, FormPipeline};
use crate::vision::{export_file_name, AnnotationStyle};

/// Service connection overrides; each falls back to the environment
#[derive(Args, Debug, Clone, Default)]
pub struct ServiceArgs {
    /// Structured-extraction service URL
    #[arg(long, env = "VISION_LLM_API_URL")]
    pub endpoint: Option<String>,

    /// Bearer token
    #[arg(long, env = "VISION_LLM_AUTH_TOKEN", hide_env_values = true)]
    pub auth_token: Option<String>,

    /// Value for the X-API-Key header
    #[arg(long, env = "VISION_LLM_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Per-attempt timeout in seconds
    #[arg(long, env = "API_TIMEOUT")]
    pub timeout: Option<u64>,

    /// Total attempts per request
    #[arg(long, env = "API_MAX_RETRIES")]
    pub max_retries: Option<u32>,
}

impl ServiceArgs {
    /// Environment configuration with command-line overrides applied
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::from_env();
        if let Some(endpoint) = non_blank(&self.endpoint) {
            config.endpoint = endpoint;
        }
        if let Some(token) = non_blank(&self.auth_token) {
            config.auth_token = Some(token);
        }
        if let Some(key) = non_blank(&self.api_key) {
            config.api_key = Some(key);
        }
        if let Some(secs) = self.timeout {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(retries) = self.max_retries {
            config.max_retries = retries;
        }
        config
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Form image (PNG, JPEG, WebP, GIF, BMP or TIFF)
    pub image: PathBuf,

    /// Minimum confidence (exclusive) for a detected region
    #[arg(long, env = "OCR_CONFIDENCE_THRESHOLD")]
    pub threshold: Option<i32>,

    /// Use a global threshold instead of denoise plus adaptive threshold
    #[arg(long)]
    pub basic: bool,

    /// Write the review overlay to this PNG
    #[arg(long)]
    pub annotated: Option<PathBuf>,

    /// Write the detected regions as JSON
    #[arg(long)]
    pub regions_out: Option<PathBuf>,

    /// Write the generated prompt as text
    #[arg(long)]
    pub prompt_out: Option<PathBuf>,

    /// Submit the form to the extraction service
    #[arg(long)]
    pub submit: bool,

    /// Directory for the exported schema
    #[arg(long, default_value = ".")]
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub service: ServiceArgs,
}

impl ExtractArgs {
    fn pipeline_config(&self) -> Result<PipelineConfig> {
        let mut config = PipelineConfig::from_env();
        if let Some(threshold) = self.threshold {
            config.confidence_threshold = threshold;
        }
        if self.basic {
            config.enhanced = false;
        }
        config.validate().map_err(|e| anyhow!(e))?;
        Ok(config)
    }
}

pub async fn run(args: ExtractArgs) -> Result<()> {
    let bytes = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("Failed to read {}", args.image.display()))?;

    let config = args.pipeline_config()?;
    let pipeline = FormPipeline::new(
        config.tesseract_detector(),
        config,
        AnnotationStyle::with_system_font(),
    );

    // Detection shells out and blocks.
    let analysis = tokio::task::spawn_blocking(move || pipeline.analyze_bytes(&bytes))
        .await
        .context("Pipeline task failed")??;

    report(&analysis);
    write_artifacts(&args, &analysis).await?;

    if args.submit {
        submit(&args, &analysis).await?;
    }

    Ok(())
}

fn report(analysis: &FormAnalysis) {
    let meta = &analysis.metadata;
    println!("📄 Form {}", meta.form_id);
    println!("  Size: {}x{}", meta.image_width, meta.image_height);
    println!(
        "  Regions: {} (threshold {}, enhanced {})",
        meta.num_ocr_entries, meta.confidence_threshold, meta.preprocessing_enabled
    );

    if !analysis.regions.is_empty() {
        let avg = analysis
            .regions
            .iter()
            .map(|r| r.confidence as f64)
            .sum::<f64>()
            / analysis.regions.len() as f64;
        println!("  Average confidence: {:.1}%", avg);
    }

    for warning in &analysis.warnings {
        println!("⚠️ {}", warning);
    }
}

async fn write_artifacts(args: &ExtractArgs, analysis: &FormAnalysis) -> Result<()> {
    if let Some(path) = &args.annotated {
        analysis
            .annotated
            .save(path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("🖼️ Annotated image: {}", path.display());
    }

    if let Some(path) = &args.regions_out {
        let json = serde_json::to_string_pretty(&analysis.regions)?;
        write_text(path, &json).await?;
        println!("📝 Regions: {}", path.display());
    }

    if let Some(path) = &args.prompt_out {
        match &analysis.payload {
            Some(payload) => {
                write_text(path, payload.prompt()).await?;
                println!("📝 Prompt: {}", path.display());
            }
            None => println!("⚠️ No prompt written: nothing was detected"),
        }
    }

    Ok(())
}

async fn submit(args: &ExtractArgs, analysis: &FormAnalysis) -> Result<()> {
    let Some(payload) = &analysis.payload else {
        bail!("Nothing was detected, so there is nothing to submit");
    };

    let config = args.service.client_config();
    config.validate().map_err(|e| anyhow!(e))?;

    let client = SchemaClient::new()?;
    let observer = |attempt: u32, max: u32| println!("📡 Attempt {}/{}", attempt, max);
    let response = client
        .send(&config, payload, &observer)
        .await
        .context("Schema extraction failed")?;

    let path = export_schema(&args.output_dir, payload.form_id(), &response).await?;
    println!("✅ Schema saved: {}", path.display());

    match response.form_schema() {
        Some(doc) => println!(
            "  {} section(s), {} field(s)",
            doc.form_schema.sections.len(),
            doc.form_schema.field_count()
        ),
        None => println!("⚠️ Response does not match the expected form_schema shape"),
    }
    Ok(())
}

/// Write a service response under its export file name
pub async fn export_schema(
    output_dir: &Path,
    form_id: &str,
    response: &ServiceResponse,
) -> Result<PathBuf> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let path = output_dir.join(export_file_name(form_id));
    write_text(&path, &response.to_pretty_json()).await?;
    info!("Exported schema to {}", path.display());
    Ok(path)
}

async fn write_text(path: &Path, contents: &str) -> Result<()> {
    tokio::fs::write(path, contents)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))
}
