#![forbid(unsafe_code)]
//! provflow-exec: the execution engine and the provenance recorder.
//!
//! The engine walks a validated lineage graph generation by generation,
//! loads raw content, dispatches step transformations and hands every
//! result to the recorder, which appends one `ProcessingStep` per executed
//! step. Execution is sequential; a failure stops the traversal and keeps
//! everything completed before it.

pub mod describe;
pub mod provenance;
pub mod runtime;

pub use describe::{fallback_description, Describer, GuardedDescriber, TemplateDescriber};
pub use provenance::{record_step, record_step_with_ids, ProvenanceRecorder};
pub use runtime::{Engine, ExecError, RunReport, Session};
pub use tokio_util::sync::CancellationToken;
