#![forbid(unsafe_code)]
//! provflow-operators: the closed set of transformation kinds.
//!
//! Design intent:
//! - Pure and synchronous: every transform maps input tables to one output
//!   table and never touches the registry or the run.
//! - Each transform exposes a planning surface (`plan`) that previews the
//!   output columns from column names alone, so callers can validate a step
//!   before any data is loaded.
//! - `Dispatcher` is the only entry point the engine uses; it matches
//!   exhaustively over `TransformKind`.

pub mod dedup;
pub mod dispatch;
pub mod encode;
pub mod feature;
pub mod impute;
pub mod kind;
pub mod merge;
pub mod plan;
pub mod scale;
pub mod select;
pub mod traits;

pub use dispatch::Dispatcher;
pub use feature::{FeatureType, FeatureTyper, ValueFeatureTyper};
pub use kind::TransformKind;
pub use plan::TransformPlan;
pub use select::Selectors;
pub use traits::{OpError, Transform};
