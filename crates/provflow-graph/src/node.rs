//! Graph nodes and their execution states.

use provflow_core::id::{DatasetId, NodeId};
use provflow_core::source::SourceDescriptor;
use provflow_operators::{Selectors, TransformKind};
use serde::{Deserialize, Serialize};

/// Pending → Ready → Executing → Done | Failed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeState {
    #[default]
    Pending,
    Ready,
    Executing,
    Done,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeKind {
    Raw {
        source: SourceDescriptor,
        /// Column names known when the node was added (empty if unknown).
        #[serde(default)]
        columns: Vec<String>,
        /// Dataset registered when the node was added with content.
        #[serde(default)]
        snapshot: Option<DatasetId>,
    },
    Step {
        kind: TransformKind,
        /// Direct predecessors in input order (input 1, input 2).
        inputs: Vec<NodeId>,
        #[serde(default)]
        selectors: Selectors,
        /// Previewed output columns.
        #[serde(default)]
        columns: Vec<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    #[serde(default)]
    pub label: Option<String>,
    pub kind: NodeKind,
    /// Produced dataset; set only by the engine.
    #[serde(default)]
    pub dataset: Option<DatasetId>,
    #[serde(default)]
    pub state: NodeState,
}

impl Node {
    pub(crate) fn new(id: NodeId, kind: NodeKind) -> Self {
        Self {
            id,
            label: None,
            kind,
            dataset: None,
            state: NodeState::Pending,
        }
    }

    pub fn is_raw(&self) -> bool {
        matches!(self.kind, NodeKind::Raw { .. })
    }

    pub fn is_step(&self) -> bool {
        matches!(self.kind, NodeKind::Step { .. })
    }

    pub fn source(&self) -> Option<&SourceDescriptor> {
        match &self.kind {
            NodeKind::Raw { source, .. } => Some(source),
            NodeKind::Step { .. } => None,
        }
    }

    pub fn transform(&self) -> Option<TransformKind> {
        match &self.kind {
            NodeKind::Step { kind, .. } => Some(*kind),
            NodeKind::Raw { .. } => None,
        }
    }

    pub fn inputs(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Step { inputs, .. } => inputs,
            NodeKind::Raw { .. } => &[],
        }
    }

    pub fn columns(&self) -> &[String] {
        match &self.kind {
            NodeKind::Raw { columns, .. } | NodeKind::Step { columns, .. } => columns,
        }
    }

    /// Label if set, else the id.
    pub fn display_name(&self) -> String {
        self.label.clone().unwrap_or_else(|| self.id.to_string())
    }

    /// Record the produced dataset and mark the node done.
    pub fn stamp(&mut self, dataset: DatasetId) {
        self.dataset = Some(dataset);
        self.state = NodeState::Done;
    }

    pub fn is_done(&self) -> bool {
        self.state == NodeState::Done && self.dataset.is_some()
    }
}
