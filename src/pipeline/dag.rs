// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 convoy contributors

//! Artifact DAG
//!
//! Links the actions of a [`StageGraph`] through the artifacts they exchange,
//! verifying that every consumed artifact is produced by an earlier action
//! and that no artifact has two producers.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::HashMap;

use crate::errors::ConvoyError;
use crate::pipeline::{ActionType, StageGraph};

/// An action in the artifact DAG
#[derive(Debug, Clone)]
pub struct DagNode {
    /// Action name
    pub name: String,
    /// `None` for the source action
    pub action_type: Option<ActionType>,
    /// Image the action runs in (build actions only)
    pub image: Option<String>,
}

impl DagNode {
    fn kind(&self) -> String {
        match self.action_type {
            Some(t) => t.to_string(),
            None => "source".to_string(),
        }
    }
}

/// Dependency graph of actions connected by artifacts
pub struct ArtifactDag {
    graph: DiGraph<DagNode, String>,
    order: Vec<NodeIndex>,
    producers: HashMap<String, NodeIndex>,
}

impl ArtifactDag {
    /// Build the DAG of a compiled graph
    pub fn build(stage_graph: &StageGraph) -> Result<Self, ConvoyError> {
        let mut dag = Self {
            graph: DiGraph::new(),
            order: Vec::new(),
            producers: HashMap::new(),
        };

        let source = &stage_graph.source.action;
        let source_node = dag.add_node(DagNode {
            name: source.name.clone(),
            action_type: None,
            image: None,
        });
        dag.add_output(source_node, source.output.name())?;

        for action in stage_graph.build_actions() {
            let node = dag.add_node(DagNode {
                name: action.name.clone(),
                action_type: Some(action.action_type),
                image: Some(action.environment.image()),
            });

            // Inputs must come from an earlier action
            let input = action.input.name();
            let producer = dag.producers.get(input).copied().ok_or_else(|| {
                ConvoyError::UnknownArtifact {
                    action: action.name.clone(),
                    artifact: input.to_string(),
                }
            })?;
            dag.graph.add_edge(producer, node, input.to_string());

            for output in &action.outputs {
                dag.add_output(node, output.name())?;
            }
        }

        Ok(dag)
    }

    fn add_node(&mut self, node: DagNode) -> NodeIndex {
        let idx = self.graph.add_node(node);
        self.order.push(idx);
        idx
    }

    fn add_output(&mut self, node: NodeIndex, artifact: &str) -> Result<(), ConvoyError> {
        if let Some(&first) = self.producers.get(artifact) {
            return Err(ConvoyError::DuplicateArtifact {
                artifact: artifact.to_string(),
                first: self.graph[first].name.clone(),
                second: self.graph[node].name.clone(),
            });
        }
        self.producers.insert(artifact.to_string(), node);
        Ok(())
    }

    /// Action names in graph order
    pub fn action_names(&self) -> Vec<&str> {
        self.order.iter().map(|&n| self.graph[n].name.as_str()).collect()
    }

    /// Action producing an artifact
    pub fn producer(&self, artifact: &str) -> Option<&str> {
        self.producers
            .get(artifact)
            .map(|&n| self.graph[n].name.as_str())
    }

    /// Actions consuming an artifact, in graph order
    pub fn consumers(&self, artifact: &str) -> Vec<&str> {
        let Some(&producer) = self.producers.get(artifact) else {
            return vec![];
        };

        let mut consumers: Vec<NodeIndex> = self
            .graph
            .edges_directed(producer, Direction::Outgoing)
            .filter(|e| e.weight() == artifact)
            .map(|e| e.target())
            .collect();
        consumers.sort();

        consumers
            .into_iter()
            .map(|n| self.graph[n].name.as_str())
            .collect()
    }

    /// Actions whose artifacts `action` consumes
    pub fn dependencies(&self, action: &str) -> Option<Vec<&str>> {
        let node = self.find(action)?;
        Some(
            self.graph
                .neighbors_directed(node, Direction::Incoming)
                .map(|n| self.graph[n].name.as_str())
                .collect(),
        )
    }

    /// Action names in dependency order
    pub fn execution_order(&self) -> Vec<&str> {
        self.topological_nodes()
            .into_iter()
            .map(|n| self.graph[n].name.as_str())
            .collect()
    }

    fn topological_nodes(&self) -> Vec<NodeIndex> {
        // Producers are always added before their consumers, so this cannot
        // hit a cycle and yields the order actions were added in
        toposort(&self.graph, None).unwrap_or_else(|_| self.order.clone())
    }

    /// Check if action A depends (directly or transitively) on action B
    pub fn depends_on(&self, action_a: &str, action_b: &str) -> bool {
        let (Some(a), Some(b)) = (self.find(action_a), self.find(action_b)) else {
            return false;
        };
        a != b && petgraph::algo::has_path_connecting(&self.graph, b, a, None)
    }

    fn find(&self, action: &str) -> Option<NodeIndex> {
        self.order
            .iter()
            .copied()
            .find(|&n| self.graph[n].name == action)
    }

    /// Artifacts produced by a node, sorted by name
    fn outputs_of(&self, node: NodeIndex) -> Vec<&str> {
        let mut outputs: Vec<&str> = self
            .producers
            .iter()
            .filter(|(_, n)| **n == node)
            .map(|(a, _)| a.as_str())
            .collect();
        outputs.sort_unstable();
        outputs
    }

    /// Generate Mermaid diagram of the DAG
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");

        for &node in &self.order {
            out.push_str(&format!(
                "    n{}[\"{} ({})\"]\n",
                node.index(),
                mermaid_escape(&self.graph[node].name),
                self.graph[node].kind()
            ));
        }

        for edge in self.graph.edge_indices() {
            if let Some((from, to)) = self.graph.edge_endpoints(edge) {
                out.push_str(&format!(
                    "    n{} -->|{}| n{}\n",
                    from.index(),
                    mermaid_escape(&self.graph[edge]),
                    to.index()
                ));
            }
        }

        out
    }

    /// Generate DOT diagram of the DAG
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph pipeline {\n");
        out.push_str("    rankdir=LR;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for &node in &self.order {
            let shape = match self.graph[node].action_type {
                None => ", shape=cylinder",
                Some(ActionType::Test) => ", style=\"rounded,dashed\"",
                Some(ActionType::Build) => "",
            };
            let name = dot_escape(&self.graph[node].name);
            out.push_str(&format!(
                "    \"{}\" [label=\"{}\\n({})\"{}];\n",
                name,
                name,
                self.graph[node].kind(),
                shape
            ));
        }

        for edge in self.graph.edge_indices() {
            if let Some((from, to)) = self.graph.edge_endpoints(edge) {
                out.push_str(&format!(
                    "    \"{}\" -> \"{}\" [label=\"{}\"];\n",
                    dot_escape(&self.graph[from].name),
                    dot_escape(&self.graph[to].name),
                    dot_escape(&self.graph[edge])
                ));
            }
        }

        out.push_str("}\n");
        out
    }

    /// Generate text representation of the action order
    pub fn to_text(&self) -> String {
        let mut out = String::new();

        for (i, node) in self.topological_nodes().into_iter().enumerate() {
            let action = &self.graph[node];
            out.push_str(&format!("{}. {} ({})", i + 1, action.name, action.kind()));

            let inputs: Vec<&str> = self
                .graph
                .edges_directed(node, Direction::Incoming)
                .map(|e| e.weight().as_str())
                .collect();
            if !inputs.is_empty() {
                out.push_str(&format!(" <- {}", inputs.join(", ")));
            }

            let outputs = self.outputs_of(node);
            if !outputs.is_empty() {
                out.push_str(&format!(" -> {}", outputs.join(", ")));
            }

            if let Some(image) = &action.image {
                out.push_str(&format!(" [image: {}]", image));
            }

            out.push('\n');
        }

        out
    }
}

/// Escape text for a quoted DOT string
fn dot_escape(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Escape text for a Mermaid label
fn mermaid_escape(text: &str) -> String {
    text.replace('"', "#quot;").replace('|', "#124;")
}
