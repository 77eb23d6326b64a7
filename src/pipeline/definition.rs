// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 convoy contributors

//! Pipeline definition structures
//!
//! Defines the schema of the JSON pipeline definition document and the
//! loader that turns raw bytes into a [`PipelineDefinition`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::path::Path;

use crate::errors::{ConvoyError, ConvoyResult};
use crate::pipeline::ActionType;

/// Fields every definition must carry as strings
const REQUIRED_FIELDS: &[&str] = &[
    "pipelineName",
    "sourceRepo",
    "codeStarConnectionArn",
    "serviceRole",
];

/// Fields that may be absent or null, but must be strings when set
const OPTIONAL_FIELDS: &[&str] = &["defaultBuildImage", "accountId", "sourceBranch", "sourceOwner"];

const STAGE_REQUIRED_FIELDS: &[&str] = &["stageName", "buildspec"];

const STAGE_OPTIONAL_FIELDS: &[&str] = &["outputName", "buildImageOverride", "type"];

/// Pipeline definition loaded from a JSON document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineDefinition {
    /// Pipeline name (unique within a deployment target)
    pub pipeline_name: String,

    /// Registry repository used when a stage has no override
    #[serde(default, deserialize_with = "null_as_default")]
    pub default_build_image: String,

    /// Source repository, passed through to the source action
    pub source_repo: String,

    /// Account identifier, passed through untouched
    #[serde(default, deserialize_with = "null_as_default")]
    pub account_id: String,

    /// Source-control connection handle
    pub code_star_connection_arn: String,

    /// Execution identity handed to every build action
    pub service_role: String,

    /// Branch to check out (falls back to settings)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_branch: Option<String>,

    /// Repository owner (falls back to the `owner/` prefix of `sourceRepo`, then settings)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_owner: Option<String>,

    /// Build stages in execution order
    pub workflow: Vec<WorkflowStage>,
}

impl PipelineDefinition {
    /// Load a definition from a file
    pub fn from_file(path: &Path) -> ConvoyResult<Self> {
        let bytes = std::fs::read(path).map_err(|e| ConvoyError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Self::load(&bytes)
    }

    /// Parse a definition from raw bytes
    ///
    /// Fails with [`ConvoyError::MalformedInput`] when the bytes are not a JSON
    /// document and with [`ConvoyError::SchemaViolation`] when the document
    /// does not have the shape of a pipeline definition. Cross-field rules
    /// (such as stage name uniqueness) are left to the compiler.
    pub fn load(bytes: &[u8]) -> ConvoyResult<Self> {
        let value: Value = serde_json::from_slice(bytes).map_err(|e| ConvoyError::MalformedInput {
            message: e.to_string(),
            line: e.line(),
            column: e.column(),
        })?;

        check_shape(&value)?;

        serde_json::from_value(value).map_err(|e| ConvoyError::SchemaViolation {
            field: "$".into(),
            reason: e.to_string(),
            help: None,
        })
    }

    /// Serialize the definition as indented JSON
    pub fn to_json_pretty(&self) -> ConvoyResult<String> {
        serde_json::to_string_pretty(self).map_err(Into::into)
    }

    /// Get a workflow stage by name
    pub fn get_stage(&self, name: &str) -> Option<&WorkflowStage> {
        self.workflow.iter().find(|s| s.stage_name == name)
    }

    /// Get all stage names in workflow order
    pub fn stage_names(&self) -> Vec<&str> {
        self.workflow.iter().map(|s| s.stage_name.as_str()).collect()
    }
}

/// A single workflow stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStage {
    /// Stage name (must be unique within the workflow)
    pub stage_name: String,

    /// Build instruction document, opaque to the compiler
    pub buildspec: String,

    /// Name of the artifact this stage produces
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,

    /// Registry repository replacing `defaultBuildImage`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_image_override: Option<String>,

    /// Raw action type ("test" or "build")
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub stage_type: Option<String>,
}

impl WorkflowStage {
    /// Create a build stage with no output and no override
    pub fn new(stage_name: impl Into<String>, buildspec: impl Into<String>) -> Self {
        Self {
            stage_name: stage_name.into(),
            buildspec: buildspec.into(),
            output_name: None,
            build_image_override: None,
            stage_type: None,
        }
    }

    /// Output artifact name, ignoring empty strings
    pub fn output_name(&self) -> Option<&str> {
        self.output_name.as_deref().filter(|s| !s.is_empty())
    }

    /// Build image override, ignoring empty strings
    pub fn build_image_override(&self) -> Option<&str> {
        self.build_image_override.as_deref().filter(|s| !s.is_empty())
    }

    /// Classified action type
    pub fn action_type(&self) -> ActionType {
        ActionType::classify(self.stage_type.as_deref())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Check the structural shape of a parsed document
fn check_shape(value: &Value) -> ConvoyResult<()> {
    let root = value
        .as_object()
        .ok_or_else(|| ConvoyError::wrong_type("$", "an object", value))?;

    for field in REQUIRED_FIELDS {
        require_string(root, field, field)?;
    }
    for field in OPTIONAL_FIELDS {
        optional_string(root, field, field)?;
    }

    let workflow = root
        .get("workflow")
        .ok_or_else(|| ConvoyError::missing_field("workflow"))?;
    let entries = workflow
        .as_array()
        .ok_or_else(|| ConvoyError::wrong_type("workflow", "an array", workflow))?;

    for (idx, entry) in entries.iter().enumerate() {
        let path = format!("workflow[{}]", idx);
        let stage = entry
            .as_object()
            .ok_or_else(|| ConvoyError::wrong_type(path.as_str(), "an object", entry))?;

        for field in STAGE_REQUIRED_FIELDS {
            require_string(stage, field, &format!("{}.{}", path, field))?;
        }
        for field in STAGE_OPTIONAL_FIELDS {
            optional_string(stage, field, &format!("{}.{}", path, field))?;
        }
    }

    Ok(())
}

fn require_string(obj: &Map<String, Value>, key: &str, path: &str) -> ConvoyResult<()> {
    match obj.get(key) {
        None => Err(ConvoyError::missing_field(path)),
        Some(Value::String(_)) => Ok(()),
        Some(other) => Err(ConvoyError::wrong_type(path, "a string", other)),
    }
}

fn optional_string(obj: &Map<String, Value>, key: &str, path: &str) -> ConvoyResult<()> {
    match obj.get(key) {
        None | Some(Value::Null) | Some(Value::String(_)) => Ok(()),
        Some(other) => Err(ConvoyError::wrong_type(path, "a string", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const EXAMPLE: &str = r#"{
        "pipelineName": "p1",
        "defaultBuildImage": "repoA",
        "sourceRepo": "org/app",
        "codeStarConnectionArn": "arn:1",
        "serviceRole": "arn:role",
        "workflow": [
            {"stageName": "unit", "buildspec": "buildspec-unit.yml", "type": "test"},
            {"stageName": "package", "buildspec": "buildspec-pkg.yml", "outputName": "PkgOut"}
        ]
    }"#;

    fn schema_field(err: ConvoyError) -> String {
        match err {
            ConvoyError::SchemaViolation { field, .. } => field,
            other => panic!("Expected SchemaViolation, got {:?}", other),
        }
    }

    #[test]
    fn test_load_example_definition() {
        let def = PipelineDefinition::load(EXAMPLE.as_bytes()).unwrap();
        assert_eq!(def.pipeline_name, "p1");
        assert_eq!(def.default_build_image, "repoA");
        assert_eq!(def.account_id, "");
        assert_eq!(def.stage_names(), vec!["unit", "package"]);

        let unit = def.get_stage("unit").unwrap();
        assert_eq!(unit.stage_type.as_deref(), Some("test"));
        assert_eq!(unit.output_name(), None);

        let package = def.get_stage("package").unwrap();
        assert_eq!(package.output_name(), Some("PkgOut"));
        assert_eq!(package.action_type(), ActionType::Build);
    }

    #[test]
    fn test_malformed_input() {
        let err = PipelineDefinition::load(b"{\"pipelineName\": ").unwrap_err();
        assert!(matches!(err, ConvoyError::MalformedInput { .. }));

        let err = PipelineDefinition::load(&[0xff, 0xfe, 0x00]).unwrap_err();
        assert!(matches!(err, ConvoyError::MalformedInput { .. }));
    }

    #[test]
    fn test_top_level_must_be_object() {
        let err = PipelineDefinition::load(b"[1, 2, 3]").unwrap_err();
        assert_eq!(schema_field(err), "$");
    }

    #[test]
    fn test_missing_required_field() {
        let doc = r#"{
            "pipelineName": "p1",
            "sourceRepo": "org/app",
            "codeStarConnectionArn": "arn:1",
            "workflow": []
        }"#;
        let err = PipelineDefinition::load(doc.as_bytes()).unwrap_err();
        assert_eq!(schema_field(err), "serviceRole");
    }

    #[test]
    fn test_workflow_must_be_array() {
        let doc = r#"{
            "pipelineName": "p1",
            "sourceRepo": "org/app",
            "codeStarConnectionArn": "arn:1",
            "serviceRole": "arn:role",
            "workflow": {"stageName": "unit"}
        }"#;
        let err = PipelineDefinition::load(doc.as_bytes()).unwrap_err();
        assert_eq!(schema_field(err), "workflow");
    }

    #[test]
    fn test_workflow_is_required() {
        let doc = r#"{
            "pipelineName": "p1",
            "sourceRepo": "org/app",
            "codeStarConnectionArn": "arn:1",
            "serviceRole": "arn:role"
        }"#;
        let err = PipelineDefinition::load(doc.as_bytes()).unwrap_err();
        assert_eq!(schema_field(err), "workflow");
    }

    #[test]
    fn test_stage_field_path_in_error() {
        let doc = r#"{
            "pipelineName": "p1",
            "sourceRepo": "org/app",
            "codeStarConnectionArn": "arn:1",
            "serviceRole": "arn:role",
            "workflow": [
                {"stageName": "unit", "buildspec": "a.yml"},
                {"stageName": 7, "buildspec": "b.yml"}
            ]
        }"#;
        let err = PipelineDefinition::load(doc.as_bytes()).unwrap_err();
        assert_eq!(schema_field(err), "workflow[1].stageName");
    }

    #[test]
    fn test_optional_fields_accept_null() {
        let doc = r#"{
            "pipelineName": "p1",
            "defaultBuildImage": null,
            "sourceRepo": "org/app",
            "codeStarConnectionArn": "arn:1",
            "serviceRole": "arn:role",
            "workflow": [
                {"stageName": "unit", "buildspec": "a.yml", "outputName": null, "type": null}
            ]
        }"#;
        let def = PipelineDefinition::load(doc.as_bytes()).unwrap();
        assert_eq!(def.default_build_image, "");
        assert_eq!(def.workflow[0].output_name, None);
    }

    #[test]
    fn test_optional_field_wrong_type() {
        let doc = r#"{
            "pipelineName": "p1",
            "sourceRepo": "org/app",
            "codeStarConnectionArn": "arn:1",
            "serviceRole": "arn:role",
            "workflow": [{"stageName": "unit", "buildspec": "a.yml", "type": true}]
        }"#;
        let err = PipelineDefinition::load(doc.as_bytes()).unwrap_err();
        assert_eq!(schema_field(err), "workflow[0].type");
    }

    #[test]
    fn test_empty_strings_are_absent() {
        let mut stage = WorkflowStage::new("unit", "a.yml");
        stage.output_name = Some(String::new());
        stage.build_image_override = Some(String::new());
        assert_eq!(stage.output_name(), None);
        assert_eq!(stage.build_image_override(), None);
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(EXAMPLE.as_bytes()).unwrap();

        let def = PipelineDefinition::from_file(file.path()).unwrap();
        assert_eq!(def.workflow.len(), 2);

        let json = def.to_json_pretty().unwrap();
        assert!(json.contains("\"pipelineName\": \"p1\""));
        assert!(json.contains("\"type\": \"test\""));
    }

    #[test]
    fn test_from_missing_file() {
        let err = PipelineDefinition::from_file(Path::new("/nonexistent/pipeline.json")).unwrap_err();
        assert!(matches!(err, ConvoyError::FileReadError { .. }));
    }
}
