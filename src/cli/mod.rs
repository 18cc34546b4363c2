// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod extract;
pub mod show_config;

use anyhow::Result;
use clap::{Parser, Subcommand};

/// Form schema extractor CLI
#[derive(Parser, Debug)]
#[command(name = "form-schema-extractor")]
#[command(version)]
#[command(about = "Extract a structured field schema from a blank form image", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Detect text regions in a form image and optionally submit them for schema extraction
    Extract(extract::ExtractArgs),

    /// Show the effective configuration with secrets masked
    Config(show_config::ConfigArgs),
}

/// Execute CLI command
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Extract(args) => extract::run(args).await,
        Commands::Config(args) => show_config::run(args),
    }
}
