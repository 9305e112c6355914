//! Encode: ordinal encoding of categorical columns.

use std::collections::{HashMap, HashSet};

use provflow_core::types::{scalar_cmp, Column, Scalar, ScalarKey, Table};

use crate::feature::{FeatureType, FeatureTyper};
use crate::plan::TransformPlan;
use crate::select::{passthrough, resolve_or_all, Selectors};
use crate::traits::{expect_inputs, OpError, Transform};

#[derive(Debug, Clone, Copy, Default)]
pub struct Encode;

impl Transform for Encode {
    fn name(&self) -> &'static str {
        "encode"
    }

    fn arity(&self) -> usize {
        1
    }

    fn plan(&self, inputs: &[&[String]], selectors: &Selectors) -> Result<TransformPlan, OpError> {
        expect_inputs(self.name(), 1, inputs)?;
        resolve_or_all(inputs[0], &selectors.columns_1)?;
        Ok(TransformPlan::unordered(inputs[0].to_vec()))
    }

    fn eval(
        &self,
        inputs: &[&Table],
        selectors: &Selectors,
        typer: &dyn FeatureTyper,
    ) -> Result<Table, OpError> {
        expect_inputs(self.name(), 1, inputs)?;
        let input = inputs[0];
        let selected: Vec<usize> = resolve_or_all(&input.column_names(), &selectors.columns_1)?
            .into_iter()
            .filter(|&i| typer.feature_type(&input.columns[i]) == FeatureType::Categorical)
            .collect();

        let mut columns: Vec<Column> = selected
            .iter()
            .map(|&i| encode_column(&input.columns[i]))
            .collect();
        columns.extend(
            passthrough(input.num_columns(), &selected)
                .into_iter()
                .map(|i| input.columns[i].clone()),
        );
        Ok(Table::new(columns))
    }
}

/// Categories are the distinct non-missing values in scalar order, coded
/// `0.0, 1.0, ...`. Missing stays missing.
pub fn encode_column(column: &Column) -> Column {
    let mut categories: Vec<&Scalar> = Vec::new();
    let mut seen: HashSet<ScalarKey> = HashSet::new();
    for v in column.values.iter().filter(|v| !v.is_null()) {
        if seen.insert(v.key()) {
            categories.push(v);
        }
    }
    categories.sort_by(|a, b| scalar_cmp(a, b));
    let codes: HashMap<ScalarKey, f64> = categories
        .iter()
        .enumerate()
        .map(|(i, v)| (v.key(), i as f64))
        .collect();

    let values = column
        .values
        .iter()
        .map(|v| match codes.get(&v.key()) {
            Some(code) if !v.is_null() => Scalar::F64(*code),
            _ => Scalar::Null,
        })
        .collect();
    Column::new(column.name.clone(), values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::ValueFeatureTyper;

    fn s(v: &str) -> Scalar {
        Scalar::Str(v.into())
    }

    #[test]
    fn codes_follow_sorted_categories() {
        let c = Column::new("c", vec![s("red"), s("blue"), Scalar::Null, s("red")]);
        let out = encode_column(&c);
        assert_eq!(
            out.values,
            vec![Scalar::F64(1.0), Scalar::F64(0.0), Scalar::Null, Scalar::F64(1.0)]
        );
    }

    #[test]
    fn numeric_columns_pass_through() {
        let t = Table::from_rows(
            &["n", "c"],
            vec![vec![Scalar::I64(7), s("b")], vec![Scalar::I64(8), s("a")]],
        );
        let out = Encode
            .eval(&[&t], &Selectors::none(), &ValueFeatureTyper)
            .unwrap();
        assert_eq!(out.column_names(), vec!["c", "n"]);
        assert_eq!(out.columns[0].values, vec![Scalar::F64(1.0), Scalar::F64(0.0)]);
        assert_eq!(out.columns[1], t.columns[0]);
    }
}
