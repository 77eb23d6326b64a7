// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 convoy contributors

//! Error types with actionable messages
//!
//! Every error carries enough context (offending stage, field or artifact)
//! to diagnose the problem without re-running the compiler.

mod recovery;

pub use recovery::RecoverySuggestion;

use miette::Diagnostic;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for convoy operations
pub type ConvoyResult<T> = Result<T, ConvoyError>;

/// Main error type for convoy
#[derive(Error, Debug, Diagnostic)]
pub enum ConvoyError {
    // ─────────────────────────────────────────────────────────────────────────
    // Loader Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Pipeline definition is not a well-formed JSON document: {message}")]
    #[diagnostic(
        code(convoy::malformed_input),
        help("Check the definition with a JSON linter; the error is near line {line}, column {column}")
    )]
    MalformedInput {
        message: String,
        line: usize,
        column: usize,
    },

    #[error("Pipeline definition field '{field}' is invalid: {reason}")]
    #[diagnostic(code(convoy::schema_violation))]
    SchemaViolation {
        field: String,
        reason: String,
        #[help]
        help: Option<String>,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Compiler Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Pipeline name is empty")]
    #[diagnostic(
        code(convoy::empty_pipeline_name),
        help("Set 'pipelineName' to a non-empty identifier")
    )]
    EmptyPipelineName,

    #[error("Stage name '{stage}' is used by workflow entries {first_index} and {duplicate_index}")]
    #[diagnostic(
        code(convoy::duplicate_stage_name),
        help("Every 'stageName' in 'workflow' must be unique")
    )]
    DuplicateStageName {
        stage: String,
        first_index: usize,
        duplicate_index: usize,
    },

    #[error("Stage '{stage}': cannot resolve build image '{reference}': {reason}")]
    #[diagnostic(
        code(convoy::build_image_resolution),
        help("Use a repository name (e.g. 'my-images/node') or an ECR repository ARN")
    )]
    BuildImageResolution {
        stage: String,
        reference: String,
        reason: String,
    },

    #[error("Action '{action}' consumes artifact '{artifact}' which no earlier action produces")]
    #[diagnostic(code(convoy::unknown_artifact))]
    UnknownArtifact { action: String, artifact: String },

    #[error("Artifact '{artifact}' is produced by both '{first}' and '{second}'")]
    #[diagnostic(
        code(convoy::duplicate_artifact),
        help("Give each 'outputName' a unique value that differs from 'SourceOutput'")
    )]
    DuplicateArtifact {
        artifact: String,
        first: String,
        second: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Backend Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Pipeline backend failed: {message}")]
    #[diagnostic(code(convoy::backend))]
    Backend { message: String },

    // ─────────────────────────────────────────────────────────────────────────
    // File Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("Failed to read file '{path}': {error}")]
    #[diagnostic(code(convoy::file_read_error))]
    FileReadError { path: PathBuf, error: String },

    #[error("Failed to write file '{path}': {error}")]
    #[diagnostic(code(convoy::file_write_error))]
    FileWriteError { path: PathBuf, error: String },

    // ─────────────────────────────────────────────────────────────────────────
    // IO/System Errors
    // ─────────────────────────────────────────────────────────────────────────
    #[error("IO error: {message}")]
    #[diagnostic(code(convoy::io_error))]
    Io { message: String },

    #[error("YAML error: {message}")]
    #[diagnostic(code(convoy::yaml_error))]
    Yaml { message: String },

    #[error("JSON error: {message}")]
    #[diagnostic(code(convoy::json_error))]
    Json { message: String },
}

impl From<std::io::Error> for ConvoyError {
    fn from(e: std::io::Error) -> Self {
        Self::Io { message: e.to_string() }
    }
}

impl From<serde_yaml::Error> for ConvoyError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::Yaml { message: e.to_string() }
    }
}

impl From<serde_json::Error> for ConvoyError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json { message: e.to_string() }
    }
}

impl ConvoyError {
    /// Create a schema violation for a field that is missing entirely
    pub fn missing_field(field: impl Into<String>) -> Self {
        let field = field.into();
        let help = Some(format!("Add '{}' to the pipeline definition", field));
        Self::SchemaViolation {
            field,
            reason: "required field is missing".into(),
            help,
        }
    }

    /// Create a schema violation for a field with the wrong JSON type
    pub fn wrong_type(field: impl Into<String>, expected: &str, got: &serde_json::Value) -> Self {
        Self::SchemaViolation {
            field: field.into(),
            reason: format!("expected {}, found {}", expected, json_type_name(got)),
            help: None,
        }
    }

    /// Whether this error was raised while loading the definition
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            Self::MalformedInput { .. } | Self::SchemaViolation { .. } | Self::FileReadError { .. }
        )
    }

    /// Stage the error refers to, if any
    pub fn stage(&self) -> Option<&str> {
        match self {
            Self::DuplicateStageName { stage, .. } | Self::BuildImageResolution { stage, .. } => {
                Some(stage)
            }
            _ => None,
        }
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_type_reason() {
        let err = ConvoyError::wrong_type("workflow", "an array", &serde_json::json!({"a": 1}));
        match err {
            ConvoyError::SchemaViolation { field, reason, .. } => {
                assert_eq!(field, "workflow");
                assert_eq!(reason, "expected an array, found an object");
            }
            other => panic!("Expected SchemaViolation, got {:?}", other),
        }
    }

    #[test]
    fn test_stage_context() {
        let err = ConvoyError::DuplicateStageName {
            stage: "unit".into(),
            first_index: 0,
            duplicate_index: 2,
        };
        assert_eq!(err.stage(), Some("unit"));
        assert!(!err.is_load_error());
        assert!(err.to_string().contains("entries 0 and 2"));
    }

    #[test]
    fn test_missing_field_is_load_error() {
        let err = ConvoyError::missing_field("serviceRole");
        assert!(err.is_load_error());
        assert!(err.to_string().contains("serviceRole"));
    }
}
