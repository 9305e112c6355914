//! Convenient re-exports for downstream crates.

pub use crate::config::{ConfigOverrides, EngineConfig};
pub use crate::error::{Error, Result};
pub use crate::export::ExportDocument;
pub use crate::id::{DatasetId, NodeId, RunId, StepId};
pub use crate::profile::{ContentProfiler, Profile, Profiler};
pub use crate::registry::{Dataset, DatasetRegistry};
pub use crate::run::{AnalysisContext, ContextEntry, PipelineRun, ProcessingStep};
pub use crate::schema::{DataType, Field, Schema};
pub use crate::source::{SourceDescriptor, SourceLoader};
pub use crate::store::{RunStore, RunSummary};
pub use crate::types::{Column, Scalar, Table};
