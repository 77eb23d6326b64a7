// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 convoy contributors

//! Definition validation
//!
//! Two layers: [`DefinitionValidator::check`] is the strict floor the compiler
//! enforces, failing fast on the first violation. [`DefinitionValidator::validate`]
//! collects every error and warning for the `validate` command.

use std::collections::HashMap;

use crate::errors::{ConvoyError, ConvoyResult};
use crate::pipeline::{ActionType, PipelineDefinition, SOURCE_ARTIFACT};

/// Pipeline definition validator
pub struct DefinitionValidator;

impl DefinitionValidator {
    /// Check the invariants compilation depends on
    pub fn check(def: &PipelineDefinition) -> ConvoyResult<()> {
        if def.pipeline_name.trim().is_empty() {
            return Err(ConvoyError::EmptyPipelineName);
        }

        let mut seen: HashMap<&str, usize> = HashMap::new();
        for (idx, stage) in def.workflow.iter().enumerate() {
            if let Some(&first_index) = seen.get(stage.stage_name.as_str()) {
                return Err(ConvoyError::DuplicateStageName {
                    stage: stage.stage_name.clone(),
                    first_index,
                    duplicate_index: idx,
                });
            }
            seen.insert(&stage.stage_name, idx);
        }

        Ok(())
    }

    /// Collect every problem with a definition
    pub fn validate(def: &PipelineDefinition) -> ValidationResult {
        let mut result = ValidationResult::new();

        if def.pipeline_name.trim().is_empty() {
            result.add_error("Pipeline name is empty");
        }

        if def.workflow.is_empty() {
            result.add_warning("Workflow has no stages - only the source stage will be generated");
        }

        if !def.account_id.is_empty()
            && !(def.account_id.len() == 12 && def.account_id.chars().all(|c| c.is_ascii_digit()))
        {
            result.add_warning(&format!(
                "accountId '{}' is not a 12-digit account number",
                def.account_id
            ));
        }

        if let (Some(owner), Some((prefix, _))) = (
            def.source_owner.as_deref().filter(|o| !o.is_empty()),
            def.source_repo.split_once('/'),
        ) {
            if !prefix.is_empty() && prefix != owner {
                result.add_warning(&format!(
                    "sourceOwner '{}' overrides owner '{}' from sourceRepo '{}'",
                    owner, prefix, def.source_repo
                ));
            }
        }

        let mut stage_names: HashMap<&str, usize> = HashMap::new();
        let mut outputs: HashMap<&str, &str> = HashMap::new();

        for (idx, stage) in def.workflow.iter().enumerate() {
            let name = stage.stage_name.as_str();

            if name.trim().is_empty() {
                result.add_error(&format!("Workflow entry {}: stageName is empty", idx));
            }

            if let Some(first) = stage_names.insert(name, idx) {
                result.add_error(&format!(
                    "Duplicate stage name '{}' (workflow entries {} and {})",
                    name, first, idx
                ));
            }

            if stage.buildspec.trim().is_empty() {
                result.add_warning(&format!("Stage '{}': buildspec is empty", name));
            }

            if let Some(raw) = stage.stage_type.as_deref() {
                if !ActionType::is_recognized(raw) {
                    result.add_warning(&format!(
                        "Stage '{}': unknown type '{}' - it will run as a build action",
                        name, raw
                    ));
                }
            }

            if stage.build_image_override().is_none() && def.default_build_image.trim().is_empty() {
                result.add_error(&format!(
                    "Stage '{}': no buildImageOverride and defaultBuildImage is empty",
                    name
                ));
            }

            if let Some(output) = stage.output_name() {
                if output == SOURCE_ARTIFACT {
                    result.add_error(&format!(
                        "Stage '{}': outputName '{}' is reserved for the source artifact",
                        name, SOURCE_ARTIFACT
                    ));
                } else if let Some(first) = outputs.insert(output, name) {
                    result.add_error(&format!(
                        "Stage '{}': outputName '{}' is already produced by stage '{}'",
                        name, output, first
                    ));
                }
            }
        }

        result
    }
}

/// Result of definition validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub fn add_warning(&mut self, message: &str) {
        self.warnings.push(message.to_string());
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}
