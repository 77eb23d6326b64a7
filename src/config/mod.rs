// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 convoy contributors

//! Compiler settings
//!
//! Loads deployment-wide defaults from `.convoy.yaml`. Values here only apply
//! when a pipeline definition leaves the matching field unset.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::errors::{ConvoyError, ConvoyResult};

/// Settings file name looked up in the working directory
pub const SETTINGS_FILE: &str = ".convoy.yaml";

/// Compiler settings from .convoy.yaml
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Branch checked out when the definition has no `sourceBranch`
    #[serde(default = "default_branch")]
    pub source_branch: String,

    /// Owner used when the definition has no `sourceOwner` and `sourceRepo`
    /// has no `owner/` prefix
    #[serde(default = "default_owner")]
    pub source_owner: String,

    /// Tag applied to every resolved build image
    #[serde(default = "default_image_tag")]
    pub image_tag: String,
}

fn default_branch() -> String {
    "main".to_string()
}

fn default_owner() -> String {
    "BBC".to_string()
}

fn default_image_tag() -> String {
    "latest".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_branch: default_branch(),
            source_owner: default_owner(),
            image_tag: default_image_tag(),
        }
    }
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file(path: &Path) -> ConvoyResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| ConvoyError::FileReadError {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| ConvoyError::Yaml {
            message: format!("{}: {}", path.display(), e),
        })
    }

    /// Load settings from the first location that exists
    ///
    /// Looks in `dir` first, then in the user configuration directory, and
    /// falls back to the built-in defaults.
    pub fn discover(dir: &Path) -> ConvoyResult<Self> {
        let local = dir.join(SETTINGS_FILE);
        if local.exists() {
            tracing::debug!("Loading settings from {}", local.display());
            return Self::from_file(&local);
        }

        if let Some(user) = user_settings_path() {
            if user.exists() {
                tracing::debug!("Loading settings from {}", user.display());
                return Self::from_file(&user);
            }
        }

        Ok(Self::default())
    }
}

/// Per-user settings location, e.g. `~/.config/convoy/settings.yaml`
pub fn user_settings_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "convoy").map(|dirs| dirs.config_dir().join("settings.yaml"))
}
