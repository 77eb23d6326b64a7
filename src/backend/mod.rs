// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 convoy contributors

//! Pipeline backends
//!
//! A backend is the pipeline-orchestration service a compiled [`StageGraph`]
//! is handed to. [`materialize`] drives any backend through the same call
//! sequence: create the pipeline, add the source stage, add the build stage.

mod manifest;

pub use manifest::{ManifestBackend, ManifestFormat, ManifestTarget, PipelineManifest};

use async_trait::async_trait;

use crate::errors::ConvoyResult;
use crate::pipeline::{BuildAction, SourceAction, StageGraph};

/// Handle to an action created in a backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionHandle(pub String);

/// Trait for pipeline-orchestration backends
#[async_trait]
pub trait PipelineBackend: Send {
    /// Create an empty pipeline running under `role`
    async fn create_pipeline(&mut self, name: &str, role: &str) -> ConvoyResult<()>;

    /// Create the source checkout action
    async fn create_source_action(&mut self, action: &SourceAction) -> ConvoyResult<ActionHandle>;

    /// Create a build or test action, with its image, input and outputs
    async fn create_build_action(&mut self, action: &BuildAction) -> ConvoyResult<ActionHandle>;

    /// Append a stage made of previously created actions
    async fn add_stage(&mut self, name: &str, actions: Vec<ActionHandle>) -> ConvoyResult<()>;

    /// Flush the pipeline to its destination
    async fn finish(&mut self) -> ConvoyResult<()>;
}

/// Summary of a materialized graph
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializeReport {
    pub pipeline_name: String,
    /// Stages in the order they were added
    pub stages: Vec<String>,
    /// Number of actions created, source included
    pub actions: usize,
}

/// Hand a compiled graph to a backend
pub async fn materialize(
    graph: &StageGraph,
    backend: &mut dyn PipelineBackend,
) -> ConvoyResult<MaterializeReport> {
    backend
        .create_pipeline(&graph.pipeline_name, &graph.service_role)
        .await?;

    let mut report = MaterializeReport {
        pipeline_name: graph.pipeline_name.clone(),
        stages: Vec::new(),
        actions: 0,
    };

    let source = backend.create_source_action(&graph.source.action).await?;
    backend.add_stage(&graph.source.name, vec![source]).await?;
    report.stages.push(graph.source.name.clone());
    report.actions += 1;

    if graph.is_source_only() {
        tracing::warn!(
            pipeline = %graph.pipeline_name,
            "Workflow is empty, pipeline only has a source stage"
        );
    } else {
        let mut handles = Vec::with_capacity(graph.build_actions().len());
        for action in graph.build_actions() {
            tracing::debug!(action = %action.name, "Creating build action");
            handles.push(backend.create_build_action(action).await?);
        }
        report.actions += handles.len();
        backend.add_stage(&graph.build.name, handles).await?;
        report.stages.push(graph.build.name.clone());
    }

    backend.finish().await?;

    tracing::info!(
        pipeline = %report.pipeline_name,
        stages = report.stages.len(),
        actions = report.actions,
        "Materialized pipeline"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ConvoyError;
    use crate::pipeline::{compile, PipelineDefinition, WorkflowStage};

    /// Backend that records every call
    #[derive(Default)]
    struct RecordingBackend {
        calls: Vec<String>,
        fail_on: Option<&'static str>,
    }

    impl RecordingBackend {
        fn record(&mut self, call: String) -> ConvoyResult<()> {
            if let Some(action) = self.fail_on {
                if call.contains(action) {
                    return Err(ConvoyError::Backend {
                        message: format!("rejected {}", call),
                    });
                }
            }
            self.calls.push(call);
            Ok(())
        }
    }

    #[async_trait]
    impl PipelineBackend for RecordingBackend {
        async fn create_pipeline(&mut self, name: &str, role: &str) -> ConvoyResult<()> {
            self.record(format!("pipeline {} {}", name, role))
        }

        async fn create_source_action(&mut self, action: &SourceAction) -> ConvoyResult<ActionHandle> {
            self.record(format!("source {} {}", action.repository, action.branch))?;
            Ok(ActionHandle(action.name.clone()))
        }

        async fn create_build_action(&mut self, action: &BuildAction) -> ConvoyResult<ActionHandle> {
            self.record(format!("build {} {}", action.name, action.action_type))?;
            Ok(ActionHandle(action.name.clone()))
        }

        async fn add_stage(&mut self, name: &str, actions: Vec<ActionHandle>) -> ConvoyResult<()> {
            self.record(format!("stage {} {}", name, actions.len()))
        }

        async fn finish(&mut self) -> ConvoyResult<()> {
            self.record("finish".into())
        }
    }

    fn make_definition(stages: Vec<WorkflowStage>) -> PipelineDefinition {
        PipelineDefinition {
            pipeline_name: "p1".into(),
            default_build_image: "repoA".into(),
            source_repo: "org/app".into(),
            account_id: String::new(),
            code_star_connection_arn: "arn:1".into(),
            service_role: "arn:role".into(),
            source_branch: None,
            source_owner: None,
            workflow: stages,
        }
    }

    #[test]
    fn test_materialize_call_order() {
        let mut unit = WorkflowStage::new("unit", "u.yml");
        unit.stage_type = Some("test".into());
        let graph = compile(&make_definition(vec![unit, WorkflowStage::new("package", "p.yml")])).unwrap();

        let mut backend = RecordingBackend::default();
        let report = tokio_test::block_on(materialize(&graph, &mut backend)).unwrap();

        assert_eq!(
            backend.calls,
            vec![
                "pipeline p1 arn:role",
                "source app main",
                "stage Source 1",
                "build Build_unit_Action test",
                "build Build_package_Action build",
                "stage Build 2",
                "finish",
            ]
        );
        assert_eq!(report.stages, vec!["Source", "Build"]);
        assert_eq!(report.actions, 3);
    }

    #[test]
    fn test_materialize_source_only() {
        let graph = compile(&make_definition(vec![])).unwrap();

        let mut backend = RecordingBackend::default();
        let report = tokio_test::block_on(materialize(&graph, &mut backend)).unwrap();

        assert_eq!(report.stages, vec!["Source"]);
        assert_eq!(backend.calls.last().map(String::as_str), Some("finish"));
        assert!(!backend.calls.iter().any(|c| c.starts_with("stage Build")));
    }

    #[test]
    fn test_materialize_stops_on_backend_error() {
        let graph = compile(&make_definition(vec![
            WorkflowStage::new("unit", "u.yml"),
            WorkflowStage::new("package", "p.yml"),
        ]))
        .unwrap();

        let mut backend = RecordingBackend {
            fail_on: Some("Build_unit_Action"),
            ..Default::default()
        };
        let result = tokio_test::block_on(materialize(&graph, &mut backend));

        assert!(matches!(result, Err(ConvoyError::Backend { .. })));
        assert!(!backend.calls.iter().any(|c| c == "finish"));
    }
}
