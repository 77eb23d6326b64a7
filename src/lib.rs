// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 convoy contributors

//! # convoy - Pipeline Definition Compiler
//!
//! `convoy` compiles a JSON pipeline definition into an ordered stage graph:
//! a source stage producing `SourceOutput`, followed by one build or test
//! action per workflow stage.
//!
//! ## Features
//!
//! - **Strict loading** - Malformed documents and schema violations are reported with the offending field
//! - **Deterministic compilation** - The same definition always yields the same graph
//! - **Image resolution** - Per-stage overrides with a default build image fallback
//! - **Artifact wiring** - Every consumed artifact is checked against its producer
//! - **Synthesis** - Emit the pipeline as a JSON or YAML manifest
//!
//! ## Quick Start
//!
//! ```bash
//! # Check a definition
//! convoy validate pipeline.json
//!
//! # Show the stage graph
//! convoy graph pipeline.json --format mermaid
//!
//! # Synthesize the pipeline
//! convoy synth --definition pipeline.json --format yaml
//! ```

pub mod backend;
pub mod cli;
pub mod config;
pub mod errors;
pub mod pipeline;
pub mod registry;
pub mod utils;

// Re-export commonly used types
pub use errors::{ConvoyError, ConvoyResult};
pub use pipeline::{compile, PipelineDefinition, StageGraph, StageGraphCompiler, WorkflowStage};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
