//! Runtime: execute a lineage graph against a pipeline run.
//!
//! Behavior:
//! - Validates the graph first; a rejected graph is never touched.
//! - Walks topological generations in order, nodes in id order, one at a
//!   time. Already-done nodes are skipped, not re-executed.
//! - Raw nodes reuse their registered snapshot when the run's registry
//!   still holds it; otherwise content comes from the `SourceLoader`.
//! - Step nodes see the datasets of their declared inputs only, in input
//!   order, and every result goes through the provenance recorder.
//! - The first failure stops the traversal. Completed nodes keep their
//!   datasets and recorded steps.

use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use provflow_core::config::EngineConfig;
use provflow_core::error::Error as CoreError;
use provflow_core::id::{DatasetId, NodeId, StepId};
use provflow_core::run::PipelineRun;
use provflow_core::source::{SourceDescriptor, SourceLoader};
use provflow_core::types::Table;
use provflow_graph::{LineageGraph, NodeKind, NodeState};
use provflow_io::JsonlWriter;
use provflow_operators::{Dispatcher, Selectors, TransformKind};

use crate::describe::{Describer, GuardedDescriber};
use crate::provenance::ProvenanceRecorder;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("graph rejected before execution: {0}")]
    InvalidTopology(#[source] CoreError),

    #[error("{node} failed: {source}")]
    NodeFailed {
        node: NodeId,
        #[source]
        source: CoreError,
    },

    #[error("run cancelled")]
    Cancelled,
}

impl ExecError {
    /// The failing node, if the error is tied to one.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            ExecError::NodeFailed { node, .. } => Some(*node),
            ExecError::InvalidTopology(CoreError::InvalidTopology { node, .. }) => *node,
            _ => None,
        }
    }

    pub fn cause(&self) -> Option<&CoreError> {
        match self {
            ExecError::InvalidTopology(e) | ExecError::NodeFailed { source: e, .. } => Some(e),
            ExecError::Cancelled => None,
        }
    }
}

/// What a successful `run` did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Nodes executed by this call, in execution order.
    pub executed: Vec<NodeId>,
    /// Steps appended to the run, in order.
    pub steps: Vec<StepId>,
    /// Nodes that were already done and left alone.
    pub skipped: Vec<NodeId>,
}

/// Engine owns the collaborators a run needs: the source loader, the
/// dispatcher and the provenance recorder.
pub struct Engine {
    cfg: EngineConfig,
    loader: Arc<dyn SourceLoader>,
    dispatcher: Dispatcher,
    recorder: ProvenanceRecorder,
    /// Checked between nodes.
    cancel: CancellationToken,
}

impl Engine {
    /// Engine with the template describer and a dispatcher built from `cfg`.
    pub fn new(cfg: EngineConfig, loader: Arc<dyn SourceLoader>) -> Self {
        let describer = GuardedDescriber::new(
            Arc::new(crate::describe::TemplateDescriber),
            cfg.describe_timeout(),
        );
        Self {
            dispatcher: Dispatcher::from_config(&cfg),
            recorder: ProvenanceRecorder::new(describer),
            cancel: CancellationToken::new(),
            loader,
            cfg,
        }
    }

    pub fn with_describer(mut self, describer: Arc<dyn Describer>) -> Self {
        let timeout = self.cfg.describe_timeout();
        self.recorder = ProvenanceRecorder::new(GuardedDescriber::new(describer, timeout));
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn with_cancel_flag(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// A handle that cancels this engine's runs.
    pub fn cancel_flag(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Install a fresh token so a cancelled engine can resume. Handles
    /// taken before the reset no longer reach this engine.
    pub fn reset_cancellation(&mut self) -> CancellationToken {
        self.cancel = CancellationToken::new();
        self.cancel.clone()
    }

    /// Execute every pending node of `graph`, recording steps into `run`.
    pub fn run(
        &self,
        graph: &mut LineageGraph,
        run: &mut PipelineRun,
    ) -> Result<RunReport, ExecError> {
        graph.validate().map_err(|e| {
            tracing::error!(error = %e, "graph rejected");
            ExecError::InvalidTopology(e)
        })?;

        let generations: Vec<Vec<NodeId>> = graph.generations().collect();
        tracing::info!(
            run = %run.id(),
            nodes = graph.len(),
            generations = generations.len(),
            "run started"
        );

        let mut report = RunReport::default();
        for (depth, generation) in generations.iter().enumerate() {
            tracing::debug!(generation = depth, nodes = ?generation, "generation started");
            // Every producer of this generation is done.
            for &id in generation {
                if let Some(node) = graph.node_mut(id) {
                    if node.state == NodeState::Pending {
                        node.state = NodeState::Ready;
                    }
                }
            }
            for &id in generation {
                if self.cancel.is_cancelled() {
                    tracing::warn!(run = %run.id(), node = %id, "run cancelled");
                    return Err(ExecError::Cancelled);
                }
                let Some(node) = graph.node_mut(id) else {
                    continue;
                };
                if node.is_done() {
                    tracing::debug!(node = %id, "already done, skipped");
                    report.skipped.push(id);
                    continue;
                }
                node.state = NodeState::Executing;

                match self.execute_node(graph, run, id) {
                    Ok((dataset, step)) => {
                        if let Some(node) = graph.node_mut(id) {
                            tracing::info!(
                                node = %id,
                                name = %node.display_name(),
                                dataset = %dataset.short(),
                                "node done"
                            );
                            node.stamp(dataset);
                        }
                        report.executed.push(id);
                        report.steps.extend(step);
                    }
                    Err(source) => {
                        if let Some(node) = graph.node_mut(id) {
                            node.state = NodeState::Failed;
                        }
                        tracing::error!(node = %id, kind = source.kind(), error = %source, "node failed");
                        return Err(ExecError::NodeFailed { node: id, source });
                    }
                }
            }
        }

        tracing::info!(
            run = %run.id(),
            executed = report.executed.len(),
            skipped = report.skipped.len(),
            steps = run.steps().len(),
            "run finished"
        );
        Ok(report)
    }

    fn execute_node(
        &self,
        graph: &LineageGraph,
        run: &mut PipelineRun,
        id: NodeId,
    ) -> Result<(DatasetId, Option<StepId>), CoreError> {
        let node = graph
            .node(id)
            .ok_or_else(|| CoreError::topology(id, "no such node"))?;
        let name = node.display_name();
        match &node.kind {
            NodeKind::Raw {
                source, snapshot, ..
            } => {
                let dataset = self.load_raw(run, source, snapshot.as_ref())?;
                Ok((dataset, None))
            }
            NodeKind::Step {
                kind,
                inputs,
                selectors,
                ..
            } => {
                let (dataset, step) =
                    self.execute_step(graph, run, id, &name, *kind, inputs, selectors)?;
                Ok((dataset, Some(step)))
            }
        }
    }

    fn load_raw(
        &self,
        run: &mut PipelineRun,
        source: &SourceDescriptor,
        snapshot: Option<&DatasetId>,
    ) -> Result<DatasetId, CoreError> {
        let content = match snapshot.and_then(|s| run.registry().get(s)) {
            Some(content) => content,
            None => {
                tracing::debug!(source = %source, "loading source");
                Arc::new(self.loader.load(source)?)
            }
        };
        run.registry_mut().register(&content)
    }

    fn execute_step(
        &self,
        graph: &LineageGraph,
        run: &mut PipelineRun,
        id: NodeId,
        name: &str,
        kind: TransformKind,
        inputs: &[NodeId],
        selectors: &Selectors,
    ) -> Result<(DatasetId, StepId), CoreError> {
        let mut tables: Vec<Arc<Table>> = Vec::with_capacity(inputs.len());
        for &input in inputs {
            let dataset = graph.dataset_of(input).ok_or_else(|| {
                CoreError::Invariant(format!("input {input} has not produced a dataset"))
            })?;
            let content = run.registry().get(dataset).ok_or_else(|| {
                CoreError::Invariant(format!("dataset {} has no content", dataset.short()))
            })?;
            tables.push(content);
        }
        let refs: Vec<&Table> = tables.iter().map(|t| t.as_ref()).collect();

        let output = self.dispatcher.execute(kind, &refs, selectors)?;
        if let Some(dir) = &self.cfg.emit_dir {
            emit(Path::new(dir), id, name, &output)?;
        }

        let step = self
            .recorder
            .record(run, kind, selectors, &refs, &[&output])?;
        let dataset = step
            .output_datasets
            .first()
            .cloned()
            .ok_or_else(|| CoreError::Invariant("step recorded without output".into()))?;
        Ok((dataset, step.id))
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("cfg", &self.cfg)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

/// Writes `<dir>/<node number>_<sanitized name>.jsonl`. The node number
/// keeps names that sanitize alike from sharing a file.
fn emit(dir: &Path, node: NodeId, name: &str, table: &Table) -> Result<(), CoreError> {
    let file: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let path = dir.join(format!("{}_{file}.jsonl", node.get()));
    let mut writer =
        JsonlWriter::to_path(&path).map_err(|e| e.into_collaborator("dataset writer"))?;
    writer
        .write_table(table)
        .map_err(|e| e.into_collaborator("dataset writer"))?;
    tracing::debug!(path = %path.display(), rows = table.num_rows(), "dataset emitted");
    Ok(())
}

/// A graph and the run it feeds, behind one owner. Editing the graph and
/// running it both need `&mut self`, so the topology cannot change while a
/// run is in flight.
#[derive(Debug, Default)]
pub struct Session {
    graph: LineageGraph,
    run: PipelineRun,
}

impl Session {
    pub fn new(graph: LineageGraph, run: PipelineRun) -> Self {
        Self { graph, run }
    }

    pub fn graph(&self) -> &LineageGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut LineageGraph {
        &mut self.graph
    }

    pub fn pipeline_run(&self) -> &PipelineRun {
        &self.run
    }

    /// Graph edits that register content need both halves at once.
    pub fn parts_mut(&mut self) -> (&mut LineageGraph, &mut PipelineRun) {
        (&mut self.graph, &mut self.run)
    }

    pub fn run(&mut self, engine: &Engine) -> Result<RunReport, ExecError> {
        engine.run(&mut self.graph, &mut self.run)
    }

    pub fn into_parts(self) -> (LineageGraph, PipelineRun) {
        (self.graph, self.run)
    }
}
