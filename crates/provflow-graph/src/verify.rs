//! Verification helpers for lineage graphs.
//!
//! Builder operations keep a graph valid on their own; these checks exist
//! for graphs that arrive some other way (deserialized, hand-edited) and are
//! run by the engine before every execution.

use std::collections::BTreeMap;

use provflow_core::error::{Error, Result};
use provflow_core::id::NodeId;

use crate::graph::LineageGraph;
use crate::node::NodeKind;

/// Smallest node id that lies on (or behind) a cycle, if any.
pub fn find_cycle(graph: &LineageGraph) -> Option<NodeId> {
    let mut in_degree: BTreeMap<NodeId, usize> = graph.nodes().map(|n| (n.id, 0)).collect();
    for e in graph.edges() {
        if let Some(d) = in_degree.get_mut(&e.to) {
            *d += 1;
        }
    }
    let mut ready: Vec<NodeId> = in_degree
        .iter()
        .filter_map(|(n, &d)| (d == 0).then_some(*n))
        .collect();
    while let Some(n) = ready.pop() {
        in_degree.remove(&n);
        for v in graph.successors(n) {
            if let Some(d) = in_degree.get_mut(&v) {
                *d -= 1;
                if *d == 0 {
                    ready.push(v);
                }
            }
        }
    }
    in_degree.keys().next().copied()
}

/// Edges reference existing nodes; raw nodes have no producers; every step
/// has exactly `arity` inputs and its incoming edges are those inputs.
pub fn check_structure(graph: &LineageGraph) -> Result<()> {
    for e in graph.edges() {
        if graph.node(e.from).is_none() {
            return Err(Error::topology(e.to, format!("edge from missing {}", e.from)));
        }
        if graph.node(e.to).is_none() {
            return Err(Error::topology(e.from, format!("edge to missing {}", e.to)));
        }
    }

    for node in graph.nodes() {
        let mut incoming = graph.predecessors(node.id);
        incoming.sort();
        match &node.kind {
            NodeKind::Raw { .. } => {
                if !incoming.is_empty() {
                    return Err(Error::topology(node.id, "raw node has producers"));
                }
            }
            NodeKind::Step { kind, inputs, .. } => {
                if inputs.len() != kind.arity() {
                    return Err(Error::topology(
                        node.id,
                        format!("{kind} takes {} input(s), has {}", kind.arity(), inputs.len()),
                    ));
                }
                let mut declared = inputs.clone();
                declared.sort();
                if declared != incoming {
                    return Err(Error::topology(
                        node.id,
                        "incoming edges do not match declared inputs",
                    ));
                }
            }
        }
    }
    Ok(())
}
