// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 convoy contributors

//! Graph command - visualize the compiled stage graph

use miette::Result;
use std::path::PathBuf;

use super::{report, GraphFormat};
use crate::config::Settings;
use crate::pipeline::{ArtifactDag, PipelineDefinition, StageGraphCompiler};

/// Run the graph command
pub async fn run(definition_path: PathBuf, format: GraphFormat, _verbose: bool) -> Result<()> {
    let definition = PipelineDefinition::from_file(&definition_path).map_err(report)?;

    let cwd = std::env::current_dir()
        .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;
    let settings = Settings::discover(&cwd).map_err(report)?;

    let graph = StageGraphCompiler::new()
        .with_settings(settings)
        .compile(&definition)
        .map_err(report)?;
    let dag = ArtifactDag::build(&graph).map_err(report)?;

    let output = match format {
        GraphFormat::Text => dag.to_text(),
        GraphFormat::Dot => dag.to_dot(),
        GraphFormat::Mermaid => dag.to_mermaid(),
        GraphFormat::Json => graph.to_json().map_err(report)?,
        GraphFormat::Yaml => graph.to_yaml().map_err(report)?,
    };

    println!("{}", output);

    Ok(())
}
