#![forbid(unsafe_code)]
//! provflow-graph: the lineage DAG of raw dataset nodes and step nodes.
//!
//! Responsibilities:
//! - Build the graph through checked operations (arity, column previews,
//!   duplicate sources, acyclicity).
//! - Produce deterministic topological generations for the engine.
//! - Validate graphs that did not come through the builder (deserialized).
//! - Parse pipeline YAML into a graph (`dsl`).
//!
//! **No execution** here. The exec crate drives traversal and stamps nodes.

pub mod dsl;
pub mod graph;
pub mod node;
pub mod schedule;
pub mod verify;

pub use graph::{Edge, LineageGraph};
pub use node::{Node, NodeKind, NodeState};
pub use schedule::Generations;
