//! The lineage graph: nodes keyed by id plus producer → consumer edges.
//!
//! Every builder operation checks its preconditions before mutating, so a
//! failed call leaves the graph (and the registry) as it was.

use std::collections::BTreeMap;

use provflow_core::error::{Error, Result};
use provflow_core::id::{DatasetId, NodeId};
use provflow_core::registry::DatasetRegistry;
use provflow_core::source::SourceDescriptor;
use provflow_core::types::Table;
use provflow_operators::{Dispatcher, Selectors, TransformKind};
use serde::{Deserialize, Serialize};

use crate::node::{Node, NodeKind, NodeState};
use crate::schedule::Generations;
use crate::verify;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub from: NodeId,
    pub to: NodeId,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineageGraph {
    nodes: BTreeMap<NodeId, Node>,
    edges: Vec<Edge>,
    next_id: u64,
}

impl LineageGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_id(&mut self) -> NodeId {
        // Deserialized graphs may carry a stale counter.
        let floor = self.nodes.keys().next_back().map(|n| n.get() + 1).unwrap_or(0);
        let id = NodeId::new(self.next_id.max(floor));
        self.next_id = id.get() + 1;
        id
    }

    /// Descriptors are compared by resolved location, so `file://x.csv`
    /// and `x.csv` name the same source.
    fn ensure_unique_source(&self, source: &SourceDescriptor) -> Result<()> {
        let location = source.location();
        if let Some(existing) = self
            .nodes
            .values()
            .find(|n| n.source().is_some_and(|s| s.location() == location))
        {
            return Err(Error::DuplicateSource(format!(
                "{source} is already loaded as {}",
                existing.id
            )));
        }
        Ok(())
    }

    /// Register `content` and add a raw node for it. The node keeps the
    /// registered id as its snapshot; it is stamped only when executed.
    pub fn add_raw_node(
        &mut self,
        registry: &mut DatasetRegistry,
        content: &Table,
        source: SourceDescriptor,
    ) -> Result<NodeId> {
        self.ensure_unique_source(&source)?;
        let dataset = registry.register(content)?;
        let id = self.fresh_id();
        tracing::debug!(node = %id, source = %source, dataset = %dataset.short(), "raw node added");
        self.nodes.insert(
            id,
            Node::new(
                id,
                NodeKind::Raw {
                    source,
                    columns: content.column_names(),
                    snapshot: Some(dataset),
                },
            ),
        );
        Ok(id)
    }

    /// Add a raw node whose content is loaded by the engine at run time.
    pub fn add_source_node(
        &mut self,
        source: SourceDescriptor,
        columns: Vec<String>,
    ) -> Result<NodeId> {
        self.ensure_unique_source(&source)?;
        let id = self.fresh_id();
        tracing::debug!(node = %id, source = %source, "source node added");
        self.nodes.insert(
            id,
            Node::new(
                id,
                NodeKind::Raw {
                    source,
                    columns,
                    snapshot: None,
                },
            ),
        );
        Ok(id)
    }

    /// Add a step node consuming `inputs` (in input order) and one edge from
    /// each input.
    pub fn add_step_node(
        &mut self,
        kind: TransformKind,
        inputs: &[NodeId],
        selectors: Selectors,
        dispatcher: &Dispatcher,
    ) -> Result<NodeId> {
        let columns = self.preview(kind, inputs, &selectors, dispatcher)?;
        let id = self.fresh_id();
        for &from in inputs {
            self.edges.push(Edge { from, to: id });
        }
        tracing::debug!(node = %id, kind = %kind, inputs = ?inputs, "step node added");
        self.nodes.insert(
            id,
            Node::new(
                id,
                NodeKind::Step {
                    kind,
                    inputs: inputs.to_vec(),
                    selectors,
                    columns,
                },
            ),
        );
        Ok(id)
    }

    fn preview(
        &self,
        kind: TransformKind,
        inputs: &[NodeId],
        selectors: &Selectors,
        dispatcher: &Dispatcher,
    ) -> Result<Vec<String>> {
        let arity = dispatcher.arity(kind);
        if inputs.len() != arity {
            return Err(Error::topology(
                None,
                format!("{kind} takes {arity} input(s), got {}", inputs.len()),
            ));
        }
        let mut cols: Vec<&[String]> = Vec::with_capacity(inputs.len());
        for input in inputs {
            let node = self
                .nodes
                .get(input)
                .ok_or_else(|| Error::topology(*input, "step input names no existing node"))?;
            cols.push(node.columns());
        }
        let plan = dispatcher.check_columns(kind, &cols, selectors)?;
        Ok(plan.output_columns)
    }

    /// Re-point input `slot` of step `to` at node `from`. Self-loops and
    /// edges that would close a cycle are rejected; the column preview is
    /// recomputed against the new input. `to` and everything downstream of
    /// it lose their stamps so the next run recomputes them.
    pub fn connect(
        &mut self,
        from: NodeId,
        to: NodeId,
        slot: usize,
        dispatcher: &Dispatcher,
    ) -> Result<()> {
        if from == to {
            return Err(Error::topology(to, "a node cannot consume itself"));
        }
        if !self.nodes.contains_key(&from) {
            return Err(Error::topology(from, "no such node"));
        }
        let target = self
            .nodes
            .get(&to)
            .ok_or_else(|| Error::topology(to, "no such node"))?;
        let NodeKind::Step {
            kind,
            inputs,
            selectors,
            ..
        } = &target.kind
        else {
            return Err(Error::topology(to, "raw nodes take no inputs"));
        };
        if slot >= inputs.len() {
            return Err(Error::topology(
                to,
                format!("{kind} has no input slot {slot}"),
            ));
        }
        if self.reaches(to, from) {
            return Err(Error::topology(to, format!("edge from {from} would close a cycle")));
        }

        let (kind, selectors) = (*kind, selectors.clone());
        let mut new_inputs = inputs.clone();
        let old = std::mem::replace(&mut new_inputs[slot], from);
        let columns = self.preview(kind, &new_inputs, &selectors, dispatcher)?;

        if let Some(pos) = self.edges.iter().position(|e| e.from == old && e.to == to) {
            self.edges[pos].from = from;
        }
        if let Some(node) = self.nodes.get_mut(&to) {
            if let NodeKind::Step {
                inputs, columns: c, ..
            } = &mut node.kind
            {
                *inputs = new_inputs;
                *c = columns;
            }
        }
        self.invalidate_from(to);
        Ok(())
    }

    /// Clear the stamp and state of `id` and of every node reachable from it.
    fn invalidate_from(&mut self, id: NodeId) {
        tracing::debug!(node = %id, "clearing stamps from rewired node");
        let mut stack = vec![id];
        let mut seen = std::collections::BTreeSet::new();
        while let Some(n) = stack.pop() {
            if !seen.insert(n) {
                continue;
            }
            if let Some(node) = self.nodes.get_mut(&n) {
                node.dataset = None;
                node.state = NodeState::Pending;
            }
            stack.extend(self.successors(n));
        }
    }

    /// True if `to` is reachable from `from` along edges.
    pub fn reaches(&self, from: NodeId, to: NodeId) -> bool {
        let mut stack = vec![from];
        let mut seen = std::collections::BTreeSet::new();
        while let Some(n) = stack.pop() {
            if n == to {
                return true;
            }
            if seen.insert(n) {
                stack.extend(self.successors(n));
            }
        }
        false
    }

    pub fn set_label(&mut self, id: NodeId, label: impl Into<String>) -> Result<()> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or_else(|| Error::topology(id, "no such node"))?;
        node.label = Some(label.into());
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_ids(&self) -> Vec<NodeId> {
        self.nodes.keys().copied().collect()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Producers feeding `id`, one entry per edge, in edge order.
    pub fn predecessors(&self, id: NodeId) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|e| e.to == id)
            .map(|e| e.from)
            .collect()
    }

    pub fn successors(&self, id: NodeId) -> Vec<NodeId> {
        self.edges
            .iter()
            .filter(|e| e.from == id)
            .map(|e| e.to)
            .collect()
    }

    pub fn dataset_of(&self, id: NodeId) -> Option<&DatasetId> {
        self.nodes.get(&id).and_then(|n| n.dataset.as_ref())
    }

    /// Lazily computed topological generations. Holding the iterator borrows
    /// the graph, so it cannot go stale.
    pub fn generations(&self) -> Generations<'_> {
        Generations::new(self)
    }

    /// Structural check: edges name existing nodes, step arity and inputs
    /// agree with incoming edges, and the graph is acyclic.
    pub fn validate(&self) -> Result<()> {
        verify::check_structure(self)?;
        if let Some(node) = verify::find_cycle(self) {
            return Err(Error::topology(node, "cycle detected"));
        }
        Ok(())
    }

    /// Forget produced datasets and states so the graph can be run again.
    pub fn reset(&mut self) {
        for node in self.nodes.values_mut() {
            node.dataset = None;
            node.state = NodeState::Pending;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provflow_core::types::Scalar;

    fn table(v: i64) -> Table {
        Table::from_rows(&["id", "v"], vec![vec![Scalar::I64(1), Scalar::I64(v)]])
    }

    fn chain() -> (LineageGraph, DatasetRegistry, Vec<NodeId>) {
        let mut g = LineageGraph::new();
        let mut reg = DatasetRegistry::new();
        let d = Dispatcher::new();
        let a = g
            .add_raw_node(&mut reg, &table(1), SourceDescriptor::memory("a"))
            .unwrap();
        let s1 = g
            .add_step_node(TransformKind::Deduplicate, &[a], Selectors::none(), &d)
            .unwrap();
        let s2 = g
            .add_step_node(TransformKind::Deduplicate, &[s1], Selectors::none(), &d)
            .unwrap();
        (g, reg, vec![a, s1, s2])
    }

    #[test]
    fn ids_are_monotonic() {
        let (_, _, ids) = chain();
        assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn duplicate_source_is_rejected_before_registering() {
        let mut g = LineageGraph::new();
        let mut reg = DatasetRegistry::new();
        g.add_raw_node(&mut reg, &table(1), SourceDescriptor::memory("a"))
            .unwrap();
        let err = g
            .add_raw_node(&mut reg, &table(2), SourceDescriptor::memory("a"))
            .unwrap_err();
        assert_eq!(err.kind(), "DuplicateSource");
        assert_eq!(reg.len(), 1);
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn file_prefix_does_not_make_a_new_source() {
        let mut g = LineageGraph::new();
        let mut reg = DatasetRegistry::new();
        g.add_raw_node(&mut reg, &table(1), SourceDescriptor::new("data/people.csv"))
            .unwrap();
        let err = g
            .add_raw_node(&mut reg, &table(2), SourceDescriptor::new("file://data/people.csv"))
            .unwrap_err();
        assert_eq!(err.kind(), "DuplicateSource");
        let err = g
            .add_source_node(SourceDescriptor::new("file://data/people.csv"), vec![])
            .unwrap_err();
        assert_eq!(err.kind(), "DuplicateSource");
        assert_eq!(g.len(), 1);
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn step_arity_and_missing_inputs_are_topology_errors() {
        let (mut g, _, ids) = chain();
        let d = Dispatcher::new();
        let err = g
            .add_step_node(TransformKind::Merge, &[ids[0]], Selectors::none(), &d)
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidTopology");
        let err = g
            .add_step_node(
                TransformKind::Deduplicate,
                &[NodeId::new(99)],
                Selectors::none(),
                &d,
            )
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidTopology");
        assert_eq!(g.len(), 3);
    }

    #[test]
    fn column_preview_failure_adds_nothing() {
        let (mut g, _, ids) = chain();
        let d = Dispatcher::new();
        let err = g
            .add_step_node(
                TransformKind::Merge,
                &[ids[0], ids[1]],
                Selectors::pairs(&["id", "v"], &["id"]),
                &d,
            )
            .unwrap_err();
        assert_eq!(err.kind(), "InvalidColumnSelection");
        assert_eq!(g.len(), 3);
        assert_eq!(g.edges().len(), 2);
    }

    #[test]
    fn connect_rejects_cycles_and_self_loops() {
        let (mut g, _, ids) = chain();
        let d = Dispatcher::new();
        let err = g.connect(ids[2], ids[1], 0, &d).unwrap_err();
        assert_eq!(err.kind(), "InvalidTopology");
        let err = g.connect(ids[1], ids[1], 0, &d).unwrap_err();
        assert_eq!(err.kind(), "InvalidTopology");
        g.validate().unwrap();
    }

    #[test]
    fn connect_rewires_an_input() {
        let (mut g, _, ids) = chain();
        let d = Dispatcher::new();
        g.connect(ids[0], ids[2], 0, &d).unwrap();
        assert_eq!(g.node(ids[2]).unwrap().inputs(), &[ids[0]]);
        assert_eq!(g.predecessors(ids[2]), vec![ids[0]]);
        g.validate().unwrap();
    }

    #[test]
    fn connect_clears_stamps_downstream_of_the_target() {
        let (mut g, _, ids) = chain();
        let d = Dispatcher::new();
        let extra = g
            .add_step_node(TransformKind::Encode, &[ids[0]], Selectors::none(), &d)
            .unwrap();
        let tail = g
            .add_step_node(TransformKind::Deduplicate, &[ids[2]], Selectors::none(), &d)
            .unwrap();
        for (i, id) in [ids[0], ids[1], ids[2], extra, tail].into_iter().enumerate() {
            g.node_mut(id).unwrap().stamp(DatasetId::new(format!("{i:064x}")));
        }

        g.connect(extra, ids[2], 0, &d).unwrap();

        assert!(g.node(ids[0]).unwrap().is_done());
        assert!(g.node(ids[1]).unwrap().is_done());
        assert!(g.node(extra).unwrap().is_done());
        for id in [ids[2], tail] {
            let node = g.node(id).unwrap();
            assert!(node.dataset.is_none());
            assert_eq!(node.state, NodeState::Pending);
        }
    }

    #[test]
    fn reset_clears_stamps() {
        let (mut g, _, ids) = chain();
        g.node_mut(ids[0]).unwrap().stamp(DatasetId::new("x"));
        g.reset();
        assert!(g.dataset_of(ids[0]).is_none());
        assert_eq!(g.node(ids[0]).unwrap().state, NodeState::Pending);
    }
}
