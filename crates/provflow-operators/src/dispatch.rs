//! Dispatcher: the single entry point from kind + inputs to a result.

use std::fmt;
use std::sync::Arc;

use provflow_core::config::EngineConfig;
use provflow_core::types::Table;

use crate::dedup::Deduplicate;
use crate::encode::Encode;
use crate::feature::{FeatureTyper, ValueFeatureTyper};
use crate::impute::ImputeMissing;
use crate::kind::TransformKind;
use crate::merge::Merge;
use crate::plan::TransformPlan;
use crate::scale::Standardize;
use crate::select::Selectors;
use crate::traits::{OpError, Transform};

#[derive(Clone)]
pub struct Dispatcher {
    typer: Arc<dyn FeatureTyper>,
    knn_neighbors: usize,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            typer: Arc::new(ValueFeatureTyper),
            knn_neighbors: 3,
        }
    }

    pub fn from_config(cfg: &EngineConfig) -> Self {
        Self::new().with_neighbors(cfg.knn_neighbors)
    }

    pub fn with_typer(mut self, typer: Arc<dyn FeatureTyper>) -> Self {
        self.typer = typer;
        self
    }

    pub fn with_neighbors(mut self, k: usize) -> Self {
        self.knn_neighbors = k.max(1);
        self
    }

    pub fn knn_neighbors(&self) -> usize {
        self.knn_neighbors
    }

    fn transform(&self, kind: TransformKind) -> Box<dyn Transform> {
        match kind {
            TransformKind::Deduplicate => Box::new(Deduplicate),
            TransformKind::ImputeMissing => Box::new(ImputeMissing::new(self.knn_neighbors)),
            TransformKind::Merge => Box::new(Merge),
            TransformKind::Standardize => Box::new(Standardize),
            TransformKind::Encode => Box::new(Encode),
        }
    }

    pub fn arity(&self, kind: TransformKind) -> usize {
        self.transform(kind).arity()
    }

    /// Preview the result columns of a step from its inputs' column names.
    pub fn check_columns(
        &self,
        kind: TransformKind,
        inputs: &[&[String]],
        selectors: &Selectors,
    ) -> Result<TransformPlan, OpError> {
        self.transform(kind).plan(inputs, selectors)
    }

    /// Run a transformation. A result with zero rows or zero columns is an
    /// error, never a value.
    pub fn execute(
        &self,
        kind: TransformKind,
        inputs: &[&Table],
        selectors: &Selectors,
    ) -> Result<Table, OpError> {
        let out = self.transform(kind).eval(inputs, selectors, self.typer.as_ref())?;
        if out.is_empty() {
            return Err(OpError::Empty(format!(
                "{kind} produced {} rows x {} columns",
                out.num_rows(),
                out.num_columns()
            )));
        }
        tracing::debug!(
            kind = %kind,
            rows = out.num_rows(),
            columns = out.num_columns(),
            "transformation executed"
        );
        Ok(out)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("knn_neighbors", &self.knn_neighbors)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use provflow_core::types::Scalar;

    #[test]
    fn arity_matches_kind() {
        let d = Dispatcher::new();
        for k in TransformKind::ALL {
            assert_eq!(d.arity(k), k.arity());
        }
    }

    #[test]
    fn empty_output_is_an_error() {
        let left = Table::from_rows(&["id"], vec![vec![Scalar::I64(1)]]);
        let right = Table::from_rows(&["id"], vec![vec![Scalar::I64(2)]]);
        let err = Dispatcher::new()
            .execute(
                TransformKind::Merge,
                &[&left, &right],
                &Selectors::pairs(&["id"], &["id"]),
            )
            .unwrap_err();
        assert!(matches!(err, OpError::Empty(_)));
    }

    #[test]
    fn wrong_input_count_is_reported() {
        let t = Table::from_rows(&["id"], vec![vec![Scalar::I64(1)]]);
        let err = Dispatcher::new()
            .execute(TransformKind::Merge, &[&t], &Selectors::pairs(&["id"], &["id"]))
            .unwrap_err();
        assert!(matches!(err, OpError::Arity { expected: 2, got: 1, .. }));
    }

    #[test]
    fn selection_errors_convert_to_the_core_taxonomy() {
        let cols = vec!["a".to_string()];
        let err = Dispatcher::new()
            .check_columns(
                TransformKind::Merge,
                &[&cols, &cols],
                &Selectors::pairs(&["a", "a"], &["a"]),
            )
            .unwrap_err();
        let core: provflow_core::error::Error = err.into();
        assert_eq!(core.kind(), "InvalidColumnSelection");
    }
}
