#![forbid(unsafe_code)]
//! provflow-core: shared kernel for the provflow lineage engine.
//!
//! This crate contains the pure data model (tables, schemas, ids), the
//! content-addressed dataset registry, pipeline-run records, and the
//! collaborator interfaces (traits) that other crates implement. There is
//! **no I/O** and **no async** here.
//!
//! Crates that use this:
//! - provflow-operators: transformations over `Table`s.
//! - provflow-graph: lineage nodes refer to `NodeId`/`DatasetId`/`SourceDescriptor`.
//! - provflow-io: implements `SourceLoader` and `RunStore`.
//! - provflow-exec: drives the registry and appends `ProcessingStep`s to a `PipelineRun`.

pub mod config;
pub mod error;
pub mod export;
pub mod hash;
pub mod id;
pub mod prelude;
pub mod profile;
pub mod registry;
pub mod run;
pub mod schema;
pub mod source;
pub mod store;
pub mod types;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
