// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 convoy contributors

//! Error recovery suggestions
//!
//! Provides actionable suggestions for recovering from errors.

use super::ConvoyError;

/// A recovery suggestion with concrete steps
#[derive(Debug, Clone)]
pub struct RecoverySuggestion {
    /// Brief description of what to do
    pub action: String,
    /// Detailed steps
    pub steps: Vec<String>,
    /// Commands to run
    pub commands: Vec<String>,
}

impl RecoverySuggestion {
    /// Pick a suggestion for an error, if one applies
    pub fn for_error(error: &ConvoyError) -> Option<Self> {
        match error {
            ConvoyError::MalformedInput { line, column, .. } => {
                Some(Self::fix_json_syntax(*line, *column))
            }
            ConvoyError::SchemaViolation { field, .. } => Some(Self::fix_schema(field)),
            ConvoyError::DuplicateStageName { stage, .. } => Some(Self::rename_stage(stage)),
            ConvoyError::BuildImageResolution { stage, reference, .. } => {
                Some(Self::fix_build_image(stage, reference))
            }
            _ => None,
        }
    }

    /// Suggest fixing invalid JSON
    pub fn fix_json_syntax(line: usize, column: usize) -> Self {
        Self {
            action: format!("Fix JSON syntax error at line {}, column {}", line, column),
            steps: vec![
                "Check for common JSON issues:".into(),
                "  • Trailing commas after the last element".into(),
                "  • Single quotes instead of double quotes".into(),
                "  • Comments (JSON does not allow them)".into(),
            ],
            commands: vec![
                "# Validate your definition:".into(),
                "python -m json.tool pipeline.json".into(),
            ],
        }
    }

    /// Suggest fixing a missing or mistyped field
    pub fn fix_schema(field: &str) -> Self {
        Self {
            action: format!("Correct the '{}' field", field),
            steps: vec![
                "Required: pipelineName, sourceRepo, codeStarConnectionArn, serviceRole, workflow"
                    .into(),
                "Each workflow entry requires: stageName, buildspec".into(),
                "Optional fields must be strings when present".into(),
            ],
            commands: vec![
                "# Re-check the definition:".into(),
                "convoy validate pipeline.json".into(),
            ],
        }
    }

    /// Suggest renaming a duplicated stage
    pub fn rename_stage(stage: &str) -> Self {
        Self {
            action: format!("Rename one of the '{}' stages", stage),
            steps: vec![
                "Stage names become action and project names in the generated pipeline".into(),
                "Two workflow entries cannot share a stageName".into(),
            ],
            commands: vec![],
        }
    }

    /// Suggest fixing an unresolvable build image
    pub fn fix_build_image(stage: &str, reference: &str) -> Self {
        let source = if reference.is_empty() {
            "defaultBuildImage is empty and no buildImageOverride is set".to_string()
        } else {
            format!("'{}' is not a valid registry repository reference", reference)
        };

        Self {
            action: format!("Fix the build image for stage '{}'", stage),
            steps: vec![
                source,
                "Accepted forms: 'repo-name', 'namespace/repo-name'".into(),
                "  or 'arn:aws:ecr:<region>:<account>:repository/<name>'".into(),
            ],
            commands: vec![],
        }
    }
}

impl std::fmt::Display for RecoverySuggestion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "→ {}", self.action)?;

        for step in &self.steps {
            writeln!(f, "  {}", step)?;
        }

        if !self.commands.is_empty() {
            writeln!(f)?;
            for cmd in &self.commands {
                writeln!(f, "  {}", cmd)?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_suggestion_for_empty_default_image() {
        let err = ConvoyError::BuildImageResolution {
            stage: "unit".into(),
            reference: String::new(),
            reason: "empty".into(),
        };
        let suggestion = RecoverySuggestion::for_error(&err).unwrap();
        let text = suggestion.to_string();
        assert!(text.contains("stage 'unit'"));
        assert!(text.contains("defaultBuildImage is empty"));
    }

    #[test]
    fn test_no_suggestion_for_io() {
        let err = ConvoyError::Io { message: "boom".into() };
        assert!(RecoverySuggestion::for_error(&err).is_none());
    }
}
