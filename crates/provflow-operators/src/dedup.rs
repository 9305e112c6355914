//! Deduplicate: drop exact duplicate rows, keeping first occurrences.

use std::collections::HashSet;

use provflow_core::types::{ScalarKey, Table};

use crate::feature::FeatureTyper;
use crate::plan::TransformPlan;
use crate::select::Selectors;
use crate::traits::{expect_inputs, OpError, Transform};

#[derive(Debug, Clone, Copy, Default)]
pub struct Deduplicate;

impl Transform for Deduplicate {
    fn name(&self) -> &'static str {
        "deduplicate"
    }

    fn arity(&self) -> usize {
        1
    }

    fn plan(&self, inputs: &[&[String]], _selectors: &Selectors) -> Result<TransformPlan, OpError> {
        expect_inputs(self.name(), 1, inputs)?;
        Ok(TransformPlan::ordered(inputs[0].to_vec()))
    }

    fn eval(
        &self,
        inputs: &[&Table],
        _selectors: &Selectors,
        _typer: &dyn FeatureTyper,
    ) -> Result<Table, OpError> {
        expect_inputs(self.name(), 1, inputs)?;
        let input = inputs[0];

        let mut seen: HashSet<Vec<ScalarKey>> = HashSet::new();
        let mut keep = Vec::new();
        for r in 0..input.num_rows() {
            let key: Vec<ScalarKey> = input.columns.iter().map(|c| c.values[r].key()).collect();
            if seen.insert(key) {
                keep.push(r);
            }
        }
        Ok(input.take_rows(&keep))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::ValueFeatureTyper;
    use provflow_core::types::Scalar;

    fn rows(t: &Table) -> Vec<Vec<Scalar>> {
        t.rows()
    }

    #[test]
    fn keeps_first_occurrence_order() {
        let t = Table::from_rows(
            &["id", "name"],
            vec![
                vec![Scalar::I64(2), Scalar::Str("b".into())],
                vec![Scalar::I64(1), Scalar::Str("a".into())],
                vec![Scalar::I64(2), Scalar::Str("b".into())],
                vec![Scalar::I64(1), Scalar::Null],
            ],
        );
        let out = Deduplicate
            .eval(&[&t], &Selectors::none(), &ValueFeatureTyper)
            .unwrap();
        assert_eq!(
            rows(&out),
            vec![
                vec![Scalar::I64(2), Scalar::Str("b".into())],
                vec![Scalar::I64(1), Scalar::Str("a".into())],
                vec![Scalar::I64(1), Scalar::Null],
            ]
        );
    }

    #[test]
    fn missing_cells_count_as_equal() {
        let t = Table::from_rows(&["x"], vec![vec![Scalar::Null], vec![Scalar::Null]]);
        let out = Deduplicate
            .eval(&[&t], &Selectors::none(), &ValueFeatureTyper)
            .unwrap();
        assert_eq!(out.num_rows(), 1);
    }
}
