// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 convoy contributors

//! Manifest backend
//!
//! Synthesizes the pipeline into a JSON or YAML manifest instead of calling a
//! live orchestration service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use super::{ActionHandle, PipelineBackend};
use crate::errors::{ConvoyError, ConvoyResult};
use crate::pipeline::{ActionType, BuildAction, SourceAction};

/// Manifest serialization format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestFormat {
    Json,
    Yaml,
}

impl std::str::FromStr for ManifestFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(format!("Unknown manifest format: {}", s)),
        }
    }
}

/// Where the manifest is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestTarget {
    Stdout,
    File(PathBuf),
    /// Keep the manifest in memory only
    None,
}

/// Synthesized pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineManifest {
    pub pipeline_name: String,
    pub role_arn: String,
    pub stages: Vec<ManifestStage>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestStage {
    pub name: String,
    pub actions: Vec<ManifestAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "provider", rename_all = "camelCase")]
pub enum ManifestAction {
    #[serde(rename_all = "camelCase")]
    CodeStarSourceConnection {
        name: String,
        connection_arn: String,
        full_repository_id: String,
        branch_name: String,
        output_artifacts: Vec<String>,
        clone_output: bool,
    },
    #[serde(rename_all = "camelCase")]
    CodeBuild {
        name: String,
        project_name: String,
        buildspec: String,
        #[serde(rename = "type")]
        action_type: ActionType,
        image: String,
        image_id: String,
        input_artifacts: Vec<String>,
        output_artifacts: Vec<String>,
        service_role: String,
    },
}

impl ManifestAction {
    fn name(&self) -> &str {
        match self {
            Self::CodeStarSourceConnection { name, .. } | Self::CodeBuild { name, .. } => name,
        }
    }
}

/// Backend writing the pipeline as a manifest document
pub struct ManifestBackend {
    format: ManifestFormat,
    target: ManifestTarget,
    manifest: Option<PipelineManifest>,
    pending: HashMap<String, ManifestAction>,
}

impl ManifestBackend {
    pub fn new(format: ManifestFormat, target: ManifestTarget) -> Self {
        Self {
            format,
            target,
            manifest: None,
            pending: HashMap::new(),
        }
    }

    /// The manifest built so far
    pub fn manifest(&self) -> Option<&PipelineManifest> {
        self.manifest.as_ref()
    }

    /// Serialize the manifest in the configured format
    pub fn render(&self) -> ConvoyResult<String> {
        let manifest = self.require_manifest()?;
        match self.format {
            ManifestFormat::Json => Ok(serde_json::to_string_pretty(manifest)?),
            ManifestFormat::Yaml => Ok(serde_yaml::to_string(manifest)?),
        }
    }

    fn require_manifest(&self) -> ConvoyResult<&PipelineManifest> {
        self.manifest.as_ref().ok_or_else(|| ConvoyError::Backend {
            message: "no pipeline has been created".into(),
        })
    }

    fn stage_pending(&mut self, action: ManifestAction) -> ConvoyResult<ActionHandle> {
        self.require_manifest()?;
        let name = action.name().to_string();
        if self.pending.insert(name.clone(), action).is_some() {
            return Err(ConvoyError::Backend {
                message: format!("action '{}' created twice", name),
            });
        }
        Ok(ActionHandle(name))
    }
}

#[async_trait]
impl PipelineBackend for ManifestBackend {
    async fn create_pipeline(&mut self, name: &str, role: &str) -> ConvoyResult<()> {
        if let Some(existing) = &self.manifest {
            return Err(ConvoyError::Backend {
                message: format!("pipeline '{}' already created", existing.pipeline_name),
            });
        }

        self.manifest = Some(PipelineManifest {
            pipeline_name: name.to_string(),
            role_arn: role.to_string(),
            stages: Vec::new(),
        });
        Ok(())
    }

    async fn create_source_action(&mut self, action: &SourceAction) -> ConvoyResult<ActionHandle> {
        self.stage_pending(ManifestAction::CodeStarSourceConnection {
            name: action.name.clone(),
            connection_arn: action.connection.clone(),
            full_repository_id: format!("{}/{}", action.owner, action.repository),
            branch_name: action.branch.clone(),
            output_artifacts: vec![action.output.name().to_string()],
            clone_output: action.clone_output,
        })
    }

    async fn create_build_action(&mut self, action: &BuildAction) -> ConvoyResult<ActionHandle> {
        self.stage_pending(ManifestAction::CodeBuild {
            name: action.name.clone(),
            project_name: action.project.clone(),
            buildspec: action.buildspec.clone(),
            action_type: action.action_type,
            image: action.environment.image(),
            image_id: action.environment.construct_id.clone(),
            input_artifacts: vec![action.input.name().to_string()],
            output_artifacts: action.outputs.iter().map(|a| a.name().to_string()).collect(),
            service_role: action.role.clone(),
        })
    }

    async fn add_stage(&mut self, name: &str, actions: Vec<ActionHandle>) -> ConvoyResult<()> {
        let mut stage = ManifestStage {
            name: name.to_string(),
            actions: Vec::with_capacity(actions.len()),
        };
        for ActionHandle(action) in actions {
            let created = self.pending.remove(&action).ok_or_else(|| ConvoyError::Backend {
                message: format!("stage '{}' references unknown action '{}'", name, action),
            })?;
            stage.actions.push(created);
        }

        let manifest = self.manifest.as_mut().ok_or_else(|| ConvoyError::Backend {
            message: "no pipeline has been created".into(),
        })?;
        manifest.stages.push(stage);
        Ok(())
    }

    async fn finish(&mut self) -> ConvoyResult<()> {
        if !self.pending.is_empty() {
            let mut orphans: Vec<&str> = self.pending.keys().map(String::as_str).collect();
            orphans.sort_unstable();
            return Err(ConvoyError::Backend {
                message: format!("actions not assigned to a stage: {}", orphans.join(", ")),
            });
        }

        let rendered = self.render()?;
        match &self.target {
            ManifestTarget::Stdout => println!("{}", rendered),
            ManifestTarget::File(path) => {
                tokio::fs::write(path, rendered)
                    .await
                    .map_err(|e| ConvoyError::FileWriteError {
                        path: path.clone(),
                        error: e.to_string(),
                    })?;
                tracing::info!("Wrote manifest to {}", path.display());
            }
            ManifestTarget::None => {}
        }
        Ok(())
    }
}
