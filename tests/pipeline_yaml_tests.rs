//! Pipeline files: parsing, graph building and end-to-end runs

mod test_data_gen;

use std::sync::Arc;

use provflow_core::config::EngineConfig;
use provflow_core::run::PipelineRun;
use provflow_exec::Engine;
use provflow_graph::dsl::{build_graph, parse_pipeline, DslError};
use provflow_io::MemoryLoader;
use provflow_operators::Dispatcher;
use test_data_gen::{cities, people};

const PIPELINE: &str = r#"
config:
  knn_neighbors: 2
  describe_timeout_ms: 250
nodes:
  - raw: { name: people, source: "memory://people" }
  - raw: { name: cities, source: "memory://cities" }
  - step: { name: clean, kind: deduplicate, inputs: [people] }
  - step:
      name: joined
      kind: merge
      inputs: [clean, cities]
      columns_1: [id]
      columns_2: [person]
"#;

fn loader() -> MemoryLoader {
    MemoryLoader::new()
        .with("people", people())
        .unwrap()
        .with("cities", cities())
        .unwrap()
}

#[test]
fn test_config_section_overrides_defaults() {
    let doc = parse_pipeline(PIPELINE).unwrap();
    let mut cfg = EngineConfig::default();
    cfg.apply(doc.config.as_ref().unwrap());
    assert_eq!(cfg.knn_neighbors, 2);
    assert_eq!(cfg.describe_timeout_ms, 250);
    assert_eq!(cfg.export_dir, EngineConfig::default().export_dir);
}

#[test]
fn test_pipeline_file_runs_end_to_end() {
    let doc = parse_pipeline(PIPELINE).unwrap();
    let mut cfg = EngineConfig::default();
    cfg.apply(doc.config.as_ref().unwrap());

    let loader = Arc::new(loader());
    let engine = Engine::new(cfg.clone(), loader.clone());
    let mut run = PipelineRun::new();
    let built = build_graph(
        &doc,
        loader.as_ref(),
        run.registry_mut(),
        &Dispatcher::from_config(&cfg),
    )
    .unwrap();
    let mut graph = built.graph;
    let joined = built.names["joined"];

    let report = engine.run(&mut graph, &mut run).unwrap();
    assert_eq!(report.steps.len(), 2);
    assert_eq!(graph.node(joined).unwrap().display_name(), "joined");

    let out = run.registry().get(graph.dataset_of(joined).unwrap()).unwrap();
    assert_eq!(out.num_rows(), 2);
    assert_eq!(out.column_names(), vec!["id", "name", "person", "city"]);
    assert!(run.steps()[1].description.starts_with("Merge"));
}

#[test]
fn test_duplicate_names_are_rejected() {
    let src = r#"
nodes:
  - raw: { name: people, source: "memory://people" }
  - raw: { name: people, source: "memory://cities" }
"#;
    let doc = parse_pipeline(src).unwrap();
    let err = build_graph(&doc, &loader(), &mut Default::default(), &Dispatcher::new())
        .unwrap_err();
    assert!(matches!(err, DslError::DuplicateName(ref n) if n == "people"));
}

#[test]
fn test_bad_selection_names_the_node() {
    let src = r#"
nodes:
  - raw: { name: people, source: "memory://people" }
  - step: { name: scaled, kind: standardize, inputs: [people], columns_1: [salary] }
"#;
    let doc = parse_pipeline(src).unwrap();
    let err = build_graph(&doc, &loader(), &mut Default::default(), &Dispatcher::new())
        .unwrap_err();
    match err {
        DslError::Node { node, source } => {
            assert_eq!(node, "scaled");
            assert_eq!(source.kind(), "InvalidColumnSelection");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_source_is_a_collaborator_failure() {
    let src = "nodes:\n  - raw: { name: gone, source: \"memory://gone\" }\n";
    let doc = parse_pipeline(src).unwrap();
    let err = build_graph(&doc, &loader(), &mut Default::default(), &Dispatcher::new())
        .unwrap_err();
    match err {
        DslError::Node { node, source } => {
            assert_eq!(node, "gone");
            assert_eq!(source.kind(), "CollaboratorFailure");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_merge_arity_is_checked() {
    let src = r#"
nodes:
  - raw: { name: people, source: "memory://people" }
  - step: { name: joined, kind: merge, inputs: [people], columns_1: [id], columns_2: [id] }
"#;
    let doc = parse_pipeline(src).unwrap();
    let err = build_graph(&doc, &loader(), &mut Default::default(), &Dispatcher::new())
        .unwrap_err();
    assert!(matches!(err, DslError::Node { .. }));
}
