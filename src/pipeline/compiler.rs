// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 convoy contributors

//! Stage graph compiler
//!
//! Turns a [`PipelineDefinition`] into a [`StageGraph`]: one source stage and
//! one build action per workflow stage, each with a resolved build image,
//! a build/test classification and its artifact wiring.
//!
//! Compilation is a pure function of the definition, the registry and the
//! settings. It holds no mutable state, so one compiler can serve concurrent
//! compilations, and it returns either a complete graph or an error.

use crate::config::Settings;
use crate::errors::{ConvoyError, ConvoyResult};
use crate::pipeline::{
    Artifact, ArtifactDag, BuildAction, BuildEnvironment, BuildStage, DefinitionValidator,
    ImageSource, PipelineDefinition, SourceAction, SourceStage, StageGraph, WorkflowStage,
    BUILD_STAGE_NAME, SOURCE_ACTION_NAME, SOURCE_STAGE_NAME,
};
use crate::registry::{EcrRegistry, ImageRegistry};

/// Compiles pipeline definitions into stage graphs
pub struct StageGraphCompiler {
    registry: Box<dyn ImageRegistry>,
    settings: Settings,
}

impl StageGraphCompiler {
    /// Create a compiler backed by the offline ECR resolver and default settings
    pub fn new() -> Self {
        Self {
            registry: Box::new(EcrRegistry::new()),
            settings: Settings::default(),
        }
    }

    /// Use a different image registry
    pub fn with_registry(mut self, registry: Box<dyn ImageRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Use different settings
    pub fn with_settings(mut self, settings: Settings) -> Self {
        self.settings = settings;
        self
    }

    /// Settings in effect
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Compile a definition into a stage graph
    pub fn compile(&self, def: &PipelineDefinition) -> ConvoyResult<StageGraph> {
        DefinitionValidator::check(def)?;

        let source = self.source_stage(def);

        let mut actions = Vec::with_capacity(def.workflow.len());
        for stage in &def.workflow {
            actions.push(self.build_action(def, stage)?);
        }

        let graph = StageGraph {
            pipeline_name: def.pipeline_name.clone(),
            service_role: def.service_role.clone(),
            source,
            build: BuildStage {
                name: BUILD_STAGE_NAME.to_string(),
                actions,
            },
        };

        ArtifactDag::build(&graph)?;

        tracing::info!(
            pipeline = %graph.pipeline_name,
            actions = graph.build_actions().len(),
            "Compiled stage graph"
        );

        Ok(graph)
    }

    fn source_stage(&self, def: &PipelineDefinition) -> SourceStage {
        let (prefix, repository) = match def.source_repo.split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() => {
                (Some(owner), repo.to_string())
            }
            _ => (None, def.source_repo.clone()),
        };

        // An explicit sourceOwner wins over the `owner/` prefix
        let owner = def
            .source_owner
            .as_deref()
            .filter(|o| !o.is_empty())
            .or(prefix)
            .unwrap_or(&self.settings.source_owner)
            .to_string();

        let branch = def
            .source_branch
            .as_deref()
            .filter(|b| !b.is_empty())
            .unwrap_or(&self.settings.source_branch)
            .to_string();

        SourceStage {
            name: SOURCE_STAGE_NAME.to_string(),
            action: SourceAction {
                name: SOURCE_ACTION_NAME.to_string(),
                connection: def.code_star_connection_arn.clone(),
                owner,
                repository,
                branch,
                output: Artifact::source(),
                clone_output: true,
            },
        }
    }

    /// Resolve the build image for a stage, honoring its override
    pub fn resolve_environment(
        &self,
        def: &PipelineDefinition,
        stage: &WorkflowStage,
    ) -> ConvoyResult<BuildEnvironment> {
        let (reference, construct_id, source) = match stage.build_image_override() {
            Some(reference) => (
                reference,
                override_construct_id(&stage.stage_name, reference),
                ImageSource::Override,
            ),
            None => (
                def.default_build_image.as_str(),
                default_construct_id(&stage.stage_name),
                ImageSource::Default,
            ),
        };

        let tag = &self.settings.image_tag;
        let repository =
            self.registry
                .resolve(reference, tag)
                .map_err(|e| ConvoyError::BuildImageResolution {
                    stage: stage.stage_name.clone(),
                    reference: reference.to_string(),
                    reason: e.to_string(),
                })?;

        Ok(BuildEnvironment {
            construct_id,
            repository,
            tag: tag.clone(),
            source,
        })
    }

    fn build_action(
        &self,
        def: &PipelineDefinition,
        stage: &WorkflowStage,
    ) -> ConvoyResult<BuildAction> {
        let environment = self.resolve_environment(def, stage)?;
        let action_type = stage.action_type();

        // Outputs are settled before the action exists so none can be dropped
        let outputs: Vec<Artifact> = stage.output_name().map(Artifact::new).into_iter().collect();

        tracing::debug!(
            stage = %stage.stage_name,
            action_type = %action_type,
            image = %environment.image(),
            outputs = outputs.len(),
            "Resolved stage"
        );

        Ok(BuildAction {
            name: BuildAction::action_name(&stage.stage_name),
            stage_name: stage.stage_name.clone(),
            project: BuildAction::project_name(&stage.stage_name),
            buildspec: stage.buildspec.clone(),
            action_type,
            input: Artifact::source(),
            outputs,
            environment,
            role: def.service_role.clone(),
        })
    }
}

impl Default for StageGraphCompiler {
    fn default() -> Self {
        Self::new()
    }
}

/// Compile a definition with the default registry and settings
pub fn compile(def: &PipelineDefinition) -> ConvoyResult<StageGraph> {
    StageGraphCompiler::new().compile(def)
}

/// Identifier for a stage that uses `defaultBuildImage`
pub fn default_construct_id(stage_name: &str) -> String {
    format!("defaultEcr_{}", stage_name)
}

/// Identifier for a stage with a `buildImageOverride`
///
/// Suffixed with a short BLAKE3 digest of the stage name and reference, so it
/// is stable across runs and distinct for every stage.
pub fn override_construct_id(stage_name: &str, reference: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(stage_name.as_bytes());
    hasher.update(&[0]);
    hasher.update(reference.as_bytes());
    let digest = hasher.finalize().to_hex();

    format!("ecr_{}_{}", stage_name, &digest.as_str()[..8])
}
