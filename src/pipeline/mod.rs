// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 convoy contributors

//! Pipeline definitions and the stage graph compiler
//!
//! This module defines the input document, the compiled graph and the
//! compiler connecting them.

mod compiler;
mod dag;
mod definition;
mod graph;
mod validation;

pub use compiler::{
    compile, default_construct_id, override_construct_id, StageGraphCompiler,
};
pub use dag::{ArtifactDag, DagNode};
pub use definition::*;
pub use graph::*;
pub use validation::{DefinitionValidator, ValidationResult};
