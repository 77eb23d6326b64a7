// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 convoy contributors

//! Synth command - compile a definition and emit the pipeline manifest

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::report;
use crate::backend::{materialize, ManifestBackend, ManifestFormat, ManifestTarget};
use crate::config::Settings;
use crate::pipeline::{PipelineDefinition, StageGraphCompiler};
use crate::utils::create_spinner;

/// Run the synth command
pub async fn run(
    definition_path: PathBuf,
    format: ManifestFormat,
    out: Option<PathBuf>,
    verbose: bool,
) -> Result<()> {
    tracing::info!("Reading pipeline definition from {}", definition_path.display());

    let definition = PipelineDefinition::from_file(&definition_path).map_err(report)?;
    tracing::info!(
        "Read pipeline definition as: {}",
        definition.to_json_pretty().map_err(report)?
    );

    let cwd = std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;
    let settings = Settings::discover(&cwd).map_err(report)?;

    let compiler = StageGraphCompiler::new().with_settings(settings);
    let graph = compiler.compile(&definition).map_err(report)?;

    let writes_file = out.is_some();
    let target = out.map(ManifestTarget::File).unwrap_or(ManifestTarget::Stdout);
    let mut backend = ManifestBackend::new(format, target.clone());

    let spinner = writes_file.then(|| create_spinner("Synthesizing pipeline..."));
    let result = materialize(&graph, &mut backend).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let summary = result.map_err(report)?;

    if let ManifestTarget::File(path) = &target {
        println!(
            "  {} Synthesized '{}' ({} actions) to {}",
            "✓".green(),
            summary.pipeline_name,
            summary.actions,
            path.display()
        );

        if verbose {
            for action in graph.build_actions() {
                let outputs: Vec<&str> = action.outputs.iter().map(|a| a.name()).collect();
                println!(
                    "    - {} ({}) {}",
                    action.name,
                    action.action_type,
                    format!("[image: {}] [outputs: {}]", action.environment.image(), outputs.join(", "))
                        .dimmed()
                );
            }
        }
    }

    Ok(())
}
