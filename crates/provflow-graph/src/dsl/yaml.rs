//! YAML → LineageGraph for pipeline files.
//!
//! Example:
//! ```yaml
//! config:
//!   knn_neighbors: 3
//! nodes:
//!   - raw:  { name: orders, source: "data/orders.csv" }
//!   - raw:  { name: customers, source: "data/customers.csv" }
//!   - step: { name: clean, kind: deduplicate, inputs: [orders] }
//!   - step:
//!       name: joined
//!       kind: merge
//!       inputs: [clean, customers]
//!       columns_1: [customer_id]
//!       columns_2: [id]
//! ```
//!
//! Inputs refer to nodes by name and must name an earlier node.

use std::collections::BTreeMap;

use provflow_core::config::ConfigOverrides;
use provflow_core::error::Error as CoreError;
use provflow_core::id::NodeId;
use provflow_core::registry::DatasetRegistry;
use provflow_core::source::{SourceDescriptor, SourceLoader};
use provflow_operators::{Dispatcher, Selectors, TransformKind};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::graph::LineageGraph;

#[derive(Debug, Error)]
pub enum DslError {
    #[error("pipeline yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("node name '{0}' is used twice")]
    DuplicateName(String),

    #[error("node '{node}' consumes '{input}', which is not an earlier node")]
    UnknownInput { node: String, input: String },

    #[error("node '{node}': {source}")]
    Node {
        node: String,
        #[source]
        source: CoreError,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineDoc {
    #[serde(default)]
    pub config: Option<ConfigOverrides>,
    pub nodes: Vec<NodeDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeDef {
    Raw {
        name: String,
        source: String,
    },
    Step {
        name: String,
        kind: TransformKind,
        inputs: Vec<String>,
        #[serde(default)]
        columns_1: Vec<String>,
        #[serde(default)]
        columns_2: Vec<String>,
    },
}

impl NodeDef {
    pub fn name(&self) -> &str {
        match self {
            NodeDef::Raw { name, .. } | NodeDef::Step { name, .. } => name,
        }
    }
}

/// A graph built from a pipeline file, with its name → id table.
#[derive(Debug)]
pub struct BuiltPipeline {
    pub graph: LineageGraph,
    pub names: BTreeMap<String, NodeId>,
}

impl BuiltPipeline {
    pub fn id_of(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }
}

pub fn parse_pipeline(yaml_src: &str) -> Result<PipelineDoc, DslError> {
    Ok(serde_yaml::from_str(yaml_src)?)
}

/// Build a graph through the public builder API. Raw content is loaded with
/// `loader` and registered in `registry`; step columns are checked as each
/// step is added.
pub fn build_graph(
    doc: &PipelineDoc,
    loader: &dyn SourceLoader,
    registry: &mut DatasetRegistry,
    dispatcher: &Dispatcher,
) -> Result<BuiltPipeline, DslError> {
    let mut graph = LineageGraph::new();
    let mut names: BTreeMap<String, NodeId> = BTreeMap::new();

    for def in &doc.nodes {
        let name = def.name().to_string();
        if names.contains_key(&name) {
            return Err(DslError::DuplicateName(name));
        }
        let at = |source: CoreError| DslError::Node {
            node: name.clone(),
            source,
        };

        let id = match def {
            NodeDef::Raw { source, .. } => {
                let source = SourceDescriptor::new(source.as_str());
                let content = loader.load(&source).map_err(at)?;
                graph
                    .add_raw_node(registry, &content, source)
                    .map_err(at)?
            }
            NodeDef::Step {
                kind,
                inputs,
                columns_1,
                columns_2,
                ..
            } => {
                let ids = inputs
                    .iter()
                    .map(|i| {
                        names.get(i).copied().ok_or_else(|| DslError::UnknownInput {
                            node: name.clone(),
                            input: i.clone(),
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                let selectors = Selectors {
                    columns_1: columns_1.clone(),
                    columns_2: columns_2.clone(),
                };
                graph
                    .add_step_node(*kind, &ids, selectors, dispatcher)
                    .map_err(at)?
            }
        };
        graph.set_label(id, name.clone()).map_err(at)?;
        names.insert(name, id);
    }

    Ok(BuiltPipeline { graph, names })
}

#[cfg(test)]
mod tests {
    use super::*;
    use provflow_core::error::Result as CoreResult;
    use provflow_core::types::{Scalar, Table};

    struct Fixed;

    impl SourceLoader for Fixed {
        fn load(&self, source: &SourceDescriptor) -> CoreResult<Table> {
            let v = source.as_str().len() as i64;
            Ok(Table::from_rows(
                &["id", "v"],
                vec![vec![Scalar::I64(1), Scalar::I64(v)]],
            ))
        }
    }

    const SRC: &str = r#"
config:
  knn_neighbors: 5
nodes:
  - raw: { name: a, source: "memory://a" }
  - raw: { name: b, source: "memory://bb" }
  - step: { name: clean, kind: deduplicate, inputs: [a] }
  - step:
      name: joined
      kind: merge
      inputs: [clean, b]
      columns_1: [id]
      columns_2: [id]
"#;

    #[test]
    fn builds_named_graph() {
        let doc = parse_pipeline(SRC).unwrap();
        assert_eq!(doc.config.as_ref().and_then(|c| c.knn_neighbors), Some(5));
        let mut reg = DatasetRegistry::new();
        let built = build_graph(&doc, &Fixed, &mut reg, &Dispatcher::new()).unwrap();
        assert_eq!(built.graph.len(), 4);
        let joined = built.id_of("joined").unwrap();
        assert_eq!(
            built.graph.node(joined).unwrap().inputs(),
            &[built.id_of("clean").unwrap(), built.id_of("b").unwrap()]
        );
        assert_eq!(
            built.graph.node(joined).unwrap().columns(),
            &["id".to_string(), "v_x".to_string(), "v_y".to_string()]
        );
        built.graph.validate().unwrap();
    }

    #[test]
    fn forward_references_are_rejected() {
        let src = r#"
nodes:
  - step: { name: s, kind: deduplicate, inputs: [later] }
  - raw: { name: later, source: "memory://x" }
"#;
        let doc = parse_pipeline(src).unwrap();
        let err = build_graph(&doc, &Fixed, &mut DatasetRegistry::new(), &Dispatcher::new())
            .unwrap_err();
        assert!(matches!(err, DslError::UnknownInput { .. }));
    }

    #[test]
    fn unknown_kind_is_a_parse_error() {
        let src = "nodes:\n  - step: { name: s, kind: pivot, inputs: [] }\n";
        assert!(matches!(parse_pipeline(src), Err(DslError::Yaml(_))));
    }
}
