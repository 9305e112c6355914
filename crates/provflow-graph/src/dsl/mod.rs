//! Pipeline description formats.

pub mod yaml;

pub use yaml::{build_graph, parse_pipeline, BuiltPipeline, DslError, NodeDef, PipelineDoc};
