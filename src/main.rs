// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 convoy contributors

//! convoy - Pipeline Definition Compiler
//!
//! Compile JSON pipeline definitions into source, build and test stages.

use clap::Parser;
use miette::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use convoy::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for manifests and graphs
    let default_filter = if cli.verbose { "convoy=debug" } else { "convoy=info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    // Change to specified directory if provided
    if let Some(ref dir) = cli.directory {
        std::env::set_current_dir(dir).map_err(|e| {
            miette::miette!("Failed to change to directory '{}': {}", dir.display(), e)
        })?;
    }

    // Dispatch to command handlers
    match cli.command {
        Commands::Synth {
            definition,
            format,
            out,
        } => convoy::cli::synth::run(definition, format, out, cli.verbose).await,
        Commands::Validate { definition } => {
            convoy::cli::validate::run(definition, cli.verbose).await
        }
        Commands::Graph { definition, format } => {
            convoy::cli::graph::run(definition, format, cli.verbose).await
        }
    }
}
