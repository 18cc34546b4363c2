// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use std::path::Path;

use anyhow::Result;
use clap::Args;

use super::extract::ServiceArgs;
use crate::config::{env_file_present, env_status, PipelineConfig, ENV_VARS};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(flatten)]
    pub service: ServiceArgs,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    let client = args.service.client_config();
    let pipeline = PipelineConfig::from_env();

    println!("🔧 Service");
    for line in client.summary().lines() {
        println!("  {}", line);
    }
    if let Err(e) = client.validate() {
        println!("  ⚠️ {}", e);
    }

    println!("\n🔍 Text detection");
    println!("  Confidence Threshold: {}", pipeline.confidence_threshold);
    println!("  Enhanced Preprocessing: {}", pipeline.enhanced);
    println!(
        "  Tesseract: {} ({})",
        pipeline
            .tesseract_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "tesseract (PATH)".to_string()),
        pipeline.tesseract_lang
    );

    println!("\n📋 Environment Status");
    let env_file = if env_file_present(Path::new(".")) {
        "✅ found"
    } else {
        "❌ not found"
    };
    println!("  .env file: {}", env_file);
    for (key, set) in env_status(ENV_VARS) {
        println!("  {} {}", if set { "✅" } else { "❌" }, key);
    }
    Ok(())
}
