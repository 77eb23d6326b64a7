// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 convoy contributors

//! Compiled stage graph
//!
//! The output of the compiler: one source stage followed by one build stage
//! whose actions keep the workflow order.

use serde::{Deserialize, Serialize};

use crate::registry::RegistryReference;

/// Artifact produced by the source action and consumed by every build action
pub const SOURCE_ARTIFACT: &str = "SourceOutput";

/// Name of the stage holding the source action
pub const SOURCE_STAGE_NAME: &str = "Source";

/// Name of the stage holding the build actions
pub const BUILD_STAGE_NAME: &str = "Build";

/// Name of the source action
pub const SOURCE_ACTION_NAME: &str = "SourceAction";

/// A named, opaque unit of data passed between actions
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Artifact(String);

impl Artifact {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The canonical source artifact
    pub fn source() -> Self {
        Self::new(SOURCE_ARTIFACT)
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Artifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build action classification
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// Build action (default)
    #[default]
    Build,
    /// Test action
    Test,
}

impl ActionType {
    /// Classify a raw `type` value
    ///
    /// Only `"test"` yields [`ActionType::Test`]; absent and unrecognized
    /// values fall back to [`ActionType::Build`].
    pub fn classify(raw: Option<&str>) -> Self {
        match raw {
            Some("test") => Self::Test,
            _ => Self::Build,
        }
    }

    /// Whether a raw `type` value is one of the recognized spellings
    pub fn is_recognized(raw: &str) -> bool {
        matches!(raw, "test" | "build")
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Build => write!(f, "build"),
            Self::Test => write!(f, "test"),
        }
    }
}

/// Where a stage's build image came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageSource {
    /// `defaultBuildImage`
    Default,
    /// `buildImageOverride`
    Override,
}

/// Resolved build environment for one action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildEnvironment {
    /// Compiler-internal identifier, unique per stage
    pub construct_id: String,
    /// Resolved registry repository
    pub repository: RegistryReference,
    /// Image tag
    pub tag: String,
    /// Whether the image is the default or an override
    pub source: ImageSource,
}

impl BuildEnvironment {
    /// Image reference as `<repository>:<tag>`
    pub fn image(&self) -> String {
        format!("{}:{}", self.repository.image_name(), self.tag)
    }
}

/// The single source-ingestion action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceAction {
    pub name: String,
    /// Source-control connection handle
    pub connection: String,
    pub owner: String,
    pub repository: String,
    pub branch: String,
    pub output: Artifact,
    /// Full clone (keeps git metadata for build actions)
    pub clone_output: bool,
}

/// Stage holding the source action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceStage {
    pub name: String,
    pub action: SourceAction,
}

/// One build or test action, derived from a workflow stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildAction {
    /// Action name (`Build_<stage>_Action`)
    pub name: String,
    /// Originating workflow stage
    pub stage_name: String,
    /// Build project name (`CdkBuild<stage>`)
    pub project: String,
    pub buildspec: String,
    pub action_type: ActionType,
    pub input: Artifact,
    pub outputs: Vec<Artifact>,
    pub environment: BuildEnvironment,
    /// Execution identity
    pub role: String,
}

impl BuildAction {
    pub fn action_name(stage_name: &str) -> String {
        format!("Build_{}_Action", stage_name)
    }

    pub fn project_name(stage_name: &str) -> String {
        format!("CdkBuild{}", stage_name)
    }
}

/// Stage holding the build actions, in workflow order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildStage {
    pub name: String,
    pub actions: Vec<BuildAction>,
}

/// Fully resolved stage graph ready for a pipeline backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageGraph {
    pub pipeline_name: String,
    pub service_role: String,
    pub source: SourceStage,
    pub build: BuildStage,
}

impl StageGraph {
    /// Build actions in workflow order
    pub fn build_actions(&self) -> &[BuildAction] {
        &self.build.actions
    }

    /// Find a build action by its workflow stage name
    pub fn action_for_stage(&self, stage_name: &str) -> Option<&BuildAction> {
        self.build.actions.iter().find(|a| a.stage_name == stage_name)
    }

    /// Whether the graph only ingests source
    pub fn is_source_only(&self) -> bool {
        self.build.actions.is_empty()
    }

    /// Every artifact declared in the graph, in production order
    pub fn artifacts(&self) -> Vec<&Artifact> {
        std::iter::once(&self.source.action.output)
            .chain(self.build.actions.iter().flat_map(|a| a.outputs.iter()))
            .collect()
    }

    /// Serialize the graph to JSON
    pub fn to_json(&self) -> crate::ConvoyResult<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }

    /// Serialize the graph to YAML
    pub fn to_yaml(&self) -> crate::ConvoyResult<String> {
        serde_yaml::to_string(self).map_err(Into::into)
    }
}
