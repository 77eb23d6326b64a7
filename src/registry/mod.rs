// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 convoy contributors

//! Container image registry
//!
//! This module provides the registry trait the compiler resolves build
//! images through, and an offline ECR implementation that accepts
//! repository names and repository ARNs.

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while resolving a registry reference
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("registry reference is empty")]
    EmptyReference,

    #[error("'{0}' is not a valid ECR repository ARN")]
    InvalidArn(String),

    #[error("'{0}' is not a valid repository name")]
    InvalidRepositoryName(String),

    #[error("'{0}' is not a valid image tag")]
    InvalidTag(String),

    #[error("repository '{0}' not found")]
    NotFound(String),
}

/// Registry that hosts a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryHost {
    pub partition: String,
    pub region: String,
    pub account: String,
}

impl RegistryHost {
    /// Registry hostname, e.g. `123456789012.dkr.ecr.eu-west-1.amazonaws.com`
    pub fn hostname(&self) -> String {
        let suffix = if self.partition == "aws-cn" {
            "amazonaws.com.cn"
        } else {
            "amazonaws.com"
        };
        format!("{}.dkr.ecr.{}.{}", self.account, self.region, suffix)
    }
}

/// A resolved registry repository reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryReference {
    /// Reference as written in the definition
    pub raw: String,
    /// Repository name within the registry
    pub repository: String,
    /// Hosting registry, known when the reference is an ARN
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<RegistryHost>,
}

impl RegistryReference {
    /// Image name without tag
    pub fn image_name(&self) -> String {
        match &self.host {
            Some(host) => format!("{}/{}", host.hostname(), self.repository),
            None => self.repository.clone(),
        }
    }
}

/// Trait for image registries
///
/// Resolution must be a pure function of its inputs so compilation stays
/// deterministic.
pub trait ImageRegistry: Send + Sync {
    /// Resolve a repository reference plus tag into an immutable image
    fn resolve(&self, reference: &str, tag: &str) -> Result<RegistryReference, RegistryError>;
}

/// Offline ECR reference resolver
///
/// Accepts `arn:<partition>:ecr:<region>:<account>:repository/<name>` and bare
/// repository names following the ECR naming rules. Upper-case letters are
/// tolerated in names since references are often registry aliases.
pub struct EcrRegistry {
    arn: Regex,
    name: Regex,
    tag: Regex,
}

impl EcrRegistry {
    pub fn new() -> Self {
        Self {
            arn: Regex::new(r"^arn:(aws[a-z-]*):ecr:([a-z0-9-]+):(\d{12}):repository/(.+)$")
                .expect("valid ARN pattern"),
            name: Regex::new(r"^[A-Za-z0-9]+(?:[._-][A-Za-z0-9]+)*(?:/[A-Za-z0-9]+(?:[._-][A-Za-z0-9]+)*)*$")
                .expect("valid repository name pattern"),
            tag: Regex::new(r"^[A-Za-z0-9_][A-Za-z0-9_.-]{0,127}$").expect("valid tag pattern"),
        }
    }

    fn check_name(&self, name: &str) -> Result<(), RegistryError> {
        if name.len() < 2 || name.len() > 256 || !self.name.is_match(name) {
            return Err(RegistryError::InvalidRepositoryName(name.to_string()));
        }
        Ok(())
    }
}

impl Default for EcrRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageRegistry for EcrRegistry {
    fn resolve(&self, reference: &str, tag: &str) -> Result<RegistryReference, RegistryError> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(RegistryError::EmptyReference);
        }
        if !self.tag.is_match(tag) {
            return Err(RegistryError::InvalidTag(tag.to_string()));
        }

        if reference.starts_with("arn:") {
            let caps = self
                .arn
                .captures(reference)
                .ok_or_else(|| RegistryError::InvalidArn(reference.to_string()))?;
            let repository = caps[4].to_string();
            self.check_name(&repository)?;

            return Ok(RegistryReference {
                raw: reference.to_string(),
                repository,
                host: Some(RegistryHost {
                    partition: caps[1].to_string(),
                    region: caps[2].to_string(),
                    account: caps[3].to_string(),
                }),
            });
        }

        self.check_name(reference)?;
        Ok(RegistryReference {
            raw: reference.to_string(),
            repository: reference.to_string(),
            host: None,
        })
    }
}
