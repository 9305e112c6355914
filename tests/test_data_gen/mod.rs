//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use provflow_core::source::SourceDescriptor;
use provflow_core::types::{Scalar, Table};
use provflow_graph::LineageGraph;
use provflow_operators::{Dispatcher, Selectors, TransformKind};
use serde_json::json;

pub fn people() -> Table {
    Table::from_rows(
        &["id", "name"],
        vec![
            vec![Scalar::I64(1), Scalar::Str("a".into())],
            vec![Scalar::I64(1), Scalar::Str("a".into())],
            vec![Scalar::I64(2), Scalar::Str("b".into())],
        ],
    )
}

pub fn people_deduped() -> Table {
    Table::from_rows(
        &["id", "name"],
        vec![
            vec![Scalar::I64(1), Scalar::Str("a".into())],
            vec![Scalar::I64(2), Scalar::Str("b".into())],
        ],
    )
}

pub fn cities() -> Table {
    Table::from_rows(
        &["person", "city"],
        vec![
            vec![Scalar::I64(2), Scalar::Str("Oslo".into())],
            vec![Scalar::I64(1), Scalar::Str("Lima".into())],
            vec![Scalar::I64(3), Scalar::Str("Kyiv".into())],
        ],
    )
}

/// Numeric table with one hole per column, for imputation.
pub fn measurements() -> Table {
    Table::from_rows(
        &["height", "weight", "group"],
        vec![
            vec![Scalar::F64(1.0), Scalar::F64(10.0), Scalar::Str("x".into())],
            vec![Scalar::F64(2.0), Scalar::Null, Scalar::Str("y".into())],
            vec![Scalar::Null, Scalar::F64(30.0), Scalar::Null],
            vec![Scalar::F64(4.0), Scalar::F64(40.0), Scalar::Str("y".into())],
        ],
    )
}

/// Columns but no rows.
pub fn empty_people() -> Table {
    Table::from_rows::<&str>(&["id", "name"], vec![])
}

/// CSV with a header and `rows` generated records, some cells missing.
pub fn write_people_csv(dir: &Path, name: &str, rows: usize) -> PathBuf {
    let path = dir.join(name);
    let mut text = String::from("id,name,age\n");
    for i in 0..rows {
        let age = if i % 4 == 3 { "NA".to_string() } else { (20 + i % 50).to_string() };
        text.push_str(&format!("{},Person{},{}\n", i, i % 3, age));
    }
    fs::write(&path, text).expect("failed to write csv");
    path
}

/// `people -> dedup -> dedup`, then rewired through serde so the two steps
/// consume each other. The builder API cannot produce this.
pub fn cyclic_graph() -> LineageGraph {
    let d = Dispatcher::new();
    let mut g = LineageGraph::new();
    let a = g
        .add_source_node(
            SourceDescriptor::memory("people"),
            vec!["id".into(), "name".into()],
        )
        .expect("source node");
    let s1 = g
        .add_step_node(TransformKind::Deduplicate, &[a], Selectors::none(), &d)
        .expect("first step");
    let s2 = g
        .add_step_node(TransformKind::Deduplicate, &[s1], Selectors::none(), &d)
        .expect("second step");

    let mut v = serde_json::to_value(&g).expect("graph to json");
    v["nodes"][s1.get().to_string()]["kind"]["inputs"] = json!([s2.get()]);
    v["edges"] = json!([
        { "from": s2.get(), "to": s1.get() },
        { "from": s1.get(), "to": s2.get() },
    ]);
    serde_json::from_value(v).expect("graph from json")
}
