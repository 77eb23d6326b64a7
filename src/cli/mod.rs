// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 convoy contributors

//! CLI command definitions and handlers
//!
//! Defines the command-line interface for convoy.

pub mod graph;
pub mod synth;
pub mod validate;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::backend::ManifestFormat;
use crate::errors::{ConvoyError, RecoverySuggestion};

/// Pipeline definition compiler
///
/// Compile JSON pipeline definitions into source, build and test stages.
#[derive(Parser, Debug)]
#[clap(
    name = "convoy",
    version,
    about = "Compile pipeline definitions into build/test stage graphs",
    long_about = None,
    after_help = "Examples:\n\
        convoy synth -d pipeline.json             Print the synthesized pipeline\n\
        convoy synth -d pipeline.json -o out.yaml -f yaml\n\
        convoy validate pipeline.json             Check a definition\n\
        convoy graph pipeline.json -f mermaid     Show the stage graph\n\n\
        See 'convoy <command> --help' for more information on a specific command."
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[clap(short, long, global = true)]
    pub verbose: bool,

    /// Change to directory before executing
    #[clap(short = 'C', long, global = true, value_name = "DIR")]
    pub directory: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a definition and synthesize the pipeline manifest
    Synth {
        /// Pipeline definition file
        #[clap(short, long, env = "CONVOY_PIPELINE_DEFINITION")]
        definition: PathBuf,

        /// Manifest format (json, yaml)
        #[clap(short, long, default_value = "json")]
        format: ManifestFormat,

        /// Write the manifest to a file instead of stdout
        #[clap(short, long)]
        out: Option<PathBuf>,
    },

    /// Validate a pipeline definition
    Validate {
        /// Pipeline definition file
        #[clap(default_value = "pipeline.json")]
        definition: PathBuf,
    },

    /// Show the compiled stage graph
    Graph {
        /// Pipeline definition file
        #[clap(default_value = "pipeline.json")]
        definition: PathBuf,

        /// Output format (text, dot, mermaid, json, yaml)
        #[clap(short, long, default_value = "text")]
        format: GraphFormat,
    },
}

/// Graph output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphFormat {
    Text,
    Dot,
    Mermaid,
    /// The compiled graph itself
    Json,
    Yaml,
}

impl std::str::FromStr for GraphFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "dot" => Ok(Self::Dot),
            "mermaid" => Ok(Self::Mermaid),
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(format!("Unknown graph format: {}", s)),
        }
    }
}

/// Print the recovery suggestion for an error and convert it for `main`,
/// which renders the diagnostic
pub(crate) fn report(error: ConvoyError) -> miette::Report {
    if let Some(suggestion) = RecoverySuggestion::for_error(&error) {
        eprintln!("{}", suggestion);
    }
    miette::Report::new(error)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_synth() {
        let cli = Cli::try_parse_from([
            "convoy", "synth", "--definition", "p.json", "--format", "yaml", "-o", "out.yaml",
        ])
        .unwrap();

        match cli.command {
            Commands::Synth { definition, format, out } => {
                assert_eq!(definition, PathBuf::from("p.json"));
                assert_eq!(format, ManifestFormat::Yaml);
                assert_eq!(out, Some(PathBuf::from("out.yaml")));
            }
            other => panic!("Expected Synth, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_graph_format() {
        let cli = Cli::try_parse_from(["convoy", "graph", "p.json", "-f", "dot"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Graph { format: GraphFormat::Dot, .. }
        ));

        assert!(Cli::try_parse_from(["convoy", "graph", "p.json", "-f", "svg"]).is_err());
    }

    #[test]
    fn test_validate_default_path() {
        let cli = Cli::try_parse_from(["convoy", "-v", "validate"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(
            cli.command,
            Commands::Validate { ref definition } if definition == &PathBuf::from("pipeline.json")
        ));
    }
}
