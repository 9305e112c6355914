//! Topological generations over the lineage graph.
//!
//! Generation 0 holds every node without incoming edges; generation k+1
//! holds the nodes whose last producer sits in generation k. Within a
//! generation nodes are ordered by id. Nodes on a cycle never become ready,
//! so the sequence simply ends early on a cyclic graph (the engine validates
//! before iterating).

use std::collections::BTreeMap;

use provflow_core::id::NodeId;

use crate::graph::LineageGraph;

/// Finite, non-restartable sequence of generations.
pub struct Generations<'g> {
    in_degree: BTreeMap<NodeId, usize>,
    dependents: BTreeMap<NodeId, Vec<NodeId>>,
    ready: Vec<NodeId>,
    _graph: std::marker::PhantomData<&'g LineageGraph>,
}

impl<'g> Generations<'g> {
    pub(crate) fn new(graph: &'g LineageGraph) -> Self {
        let mut in_degree: BTreeMap<NodeId, usize> =
            graph.nodes().map(|n| (n.id, 0)).collect();
        let mut dependents: BTreeMap<NodeId, Vec<NodeId>> = BTreeMap::new();

        for e in graph.edges() {
            if let Some(d) = in_degree.get_mut(&e.to) {
                *d += 1;
            }
            dependents.entry(e.from).or_default().push(e.to);
        }

        let ready = in_degree
            .iter()
            .filter_map(|(n, &deg)| (deg == 0).then_some(*n))
            .collect();

        Self {
            in_degree,
            dependents,
            ready,
            _graph: std::marker::PhantomData,
        }
    }
}

impl Iterator for Generations<'_> {
    type Item = Vec<NodeId>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.ready.is_empty() {
            return None;
        }
        let current = std::mem::take(&mut self.ready);
        let mut next = Vec::new();
        for n in &current {
            for v in self.dependents.get(n).into_iter().flatten() {
                if let Some(deg) = self.in_degree.get_mut(v) {
                    *deg -= 1;
                    if *deg == 0 {
                        next.push(*v);
                    }
                }
            }
        }
        next.sort();
        self.ready = next;
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provflow_core::registry::DatasetRegistry;
    use provflow_core::source::SourceDescriptor;
    use provflow_core::types::{Scalar, Table};
    use provflow_operators::{Dispatcher, Selectors, TransformKind};

    fn t(v: i64) -> Table {
        Table::from_rows(&["id"], vec![vec![Scalar::I64(v)]])
    }

    #[test]
    fn diamond_generations_are_ordered_by_id() {
        let mut g = LineageGraph::new();
        let mut reg = DatasetRegistry::new();
        let d = Dispatcher::new();
        let b = g
            .add_raw_node(&mut reg, &t(2), SourceDescriptor::memory("b"))
            .unwrap();
        let a = g
            .add_raw_node(&mut reg, &t(1), SourceDescriptor::memory("a"))
            .unwrap();
        let s_b = g
            .add_step_node(TransformKind::Deduplicate, &[b], Selectors::none(), &d)
            .unwrap();
        let m = g
            .add_step_node(
                TransformKind::Merge,
                &[a, s_b],
                Selectors::pairs(&["id"], &["id"]),
                &d,
            )
            .unwrap();

        let gens: Vec<Vec<NodeId>> = g.generations().collect();
        assert_eq!(gens, vec![vec![b, a], vec![s_b], vec![m]]);
    }

    #[test]
    fn generations_see_mutations() {
        let mut g = LineageGraph::new();
        let mut reg = DatasetRegistry::new();
        let a = g
            .add_raw_node(&mut reg, &t(1), SourceDescriptor::memory("a"))
            .unwrap();
        assert_eq!(g.generations().count(), 1);
        g.add_step_node(
            TransformKind::Deduplicate,
            &[a],
            Selectors::none(),
            &Dispatcher::new(),
        )
        .unwrap();
        assert_eq!(g.generations().count(), 2);
    }

    #[test]
    fn empty_graph_has_no_generations() {
        assert!(LineageGraph::new().generations().next().is_none());
    }
}
