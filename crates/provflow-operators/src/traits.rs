//! Transform trait + common interfaces.
//!
//! The dispatcher calls `plan(...)` to preview output columns when a step is
//! added to a graph, then `eval(...)` when the engine reaches the step.

use provflow_core::error::Error as CoreError;
use provflow_core::types::Table;
use thiserror::Error;

use crate::feature::FeatureTyper;
use crate::plan::TransformPlan;
use crate::select::Selectors;

#[derive(Debug, Error)]
pub enum OpError {
    #[error("{kind} expects {expected} input(s), got {got}")]
    Arity {
        kind: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("{0}")]
    Selection(String),

    #[error("{0}")]
    Empty(String),

    #[error("execution error: {0}")]
    Exec(String),
}

impl From<OpError> for CoreError {
    fn from(e: OpError) -> Self {
        match e {
            OpError::Arity { .. } => CoreError::topology(None, e.to_string()),
            OpError::Selection(msg) => CoreError::InvalidColumnSelection(msg),
            OpError::Empty(msg) => CoreError::EmptyResult(msg),
            OpError::Exec(msg) => CoreError::Invariant(msg),
        }
    }
}

/// Trait that all transformation kinds implement.
///
/// Invariants:
/// - `plan` only looks at column names; it never needs data.
/// - `eval` is deterministic given the same inputs and selectors.
pub trait Transform: Send + Sync {
    /// Stable snake_case name.
    fn name(&self) -> &'static str;

    /// Number of input tables.
    fn arity(&self) -> usize;

    /// Validate the selectors against the input column names and preview
    /// the output columns.
    fn plan(&self, inputs: &[&[String]], selectors: &Selectors) -> Result<TransformPlan, OpError>;

    /// Execute over materialized inputs. `inputs.len()` equals `arity()`.
    fn eval(
        &self,
        inputs: &[&Table],
        selectors: &Selectors,
        typer: &dyn FeatureTyper,
    ) -> Result<Table, OpError>;
}

/// Shared arity guard for transform implementations.
pub(crate) fn expect_inputs<T>(
    kind: &'static str,
    expected: usize,
    inputs: &[T],
) -> Result<(), OpError> {
    if inputs.len() != expected {
        return Err(OpError::Arity {
            kind,
            expected,
            got: inputs.len(),
        });
    }
    Ok(())
}
