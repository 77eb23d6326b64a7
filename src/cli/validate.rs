// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 convoy contributors

//! Validate command - check a pipeline definition

use colored::Colorize;
use miette::Result;
use std::path::PathBuf;

use super::report;
use crate::config::Settings;
use crate::pipeline::{DefinitionValidator, PipelineDefinition, StageGraphCompiler};

/// Run the validate command
pub async fn run(definition_path: PathBuf, verbose: bool) -> Result<()> {
    println!("{}", "Validating pipeline definition...".bold());
    println!();

    let definition = match PipelineDefinition::from_file(&definition_path) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("  {} Failed to load definition", "✗".red());
            eprintln!();
            return Err(report(e));
        }
    };

    println!("  {} Definition has the expected shape", "✓".green());

    let mut validation = DefinitionValidator::validate(&definition);

    // Compile only a lint-clean definition
    if validation.is_valid() {
        let cwd = std::env::current_dir()
            .map_err(|e| miette::miette!("Failed to get current directory: {}", e))?;
        let settings = Settings::discover(&cwd).map_err(report)?;

        match StageGraphCompiler::new().with_settings(settings).compile(&definition) {
            Ok(graph) => println!(
                "  {} Compiles to {} build action(s)",
                "✓".green(),
                graph.build_actions().len()
            ),
            Err(e) => validation.add_error(&e.to_string()),
        }
    }

    if !validation.errors.is_empty() {
        println!();
        println!("{}:", "Errors".red().bold());
        for error in &validation.errors {
            println!("  {} {}", "✗".red(), error);
        }
    }

    if !validation.warnings.is_empty() {
        println!();
        println!("{}:", "Warnings".yellow().bold());
        for warning in &validation.warnings {
            println!("  {} {}", "⚠".yellow(), warning);
        }
    }

    if verbose {
        println!();
        println!("{}:", "Pipeline summary".bold());
        println!("  Name: {}", definition.pipeline_name);
        println!("  Source: {}", definition.source_repo);
        println!("  Stages: {}", definition.workflow.len());
        for stage in &definition.workflow {
            let image = stage
                .build_image_override()
                .unwrap_or(definition.default_build_image.as_str());
            let output = stage
                .output_name()
                .map(|o| format!(" -> {}", o))
                .unwrap_or_default();
            println!(
                "    - {} ({}){} {}",
                stage.stage_name,
                stage.action_type(),
                output,
                format!("[image: {}]", image).dimmed()
            );
        }
    }

    println!();

    if !validation.is_valid() {
        Err(miette::miette!("Pipeline definition is invalid"))
    } else if validation.has_warnings() {
        println!("{}", "Pipeline definition is valid but has warnings.".yellow().bold());
        Ok(())
    } else {
        println!("{}", "Pipeline definition is valid!".green().bold());
        Ok(())
    }
}
