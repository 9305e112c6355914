//! Standardize: zero-mean, unit-variance scaling of numeric columns.

use provflow_core::types::{Column, Scalar, Table};

use crate::feature::{FeatureType, FeatureTyper};
use crate::plan::TransformPlan;
use crate::select::{passthrough, resolve_or_all, Selectors};
use crate::traits::{expect_inputs, OpError, Transform};

/// Scales the numeric columns of the selection (empty selection = every
/// column). Non-numeric selected columns pass through untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Standardize;

impl Transform for Standardize {
    fn name(&self) -> &'static str {
        "standardize"
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
            .filter(|&i| typer.feature_type(&input.columns[i]) == FeatureType::Numeric)
            .collect();

        let mut columns: Vec<Column> = selected
            .iter()
            .map(|&i| standardize_column(&input.columns[i]))
            .collect();
        columns.extend(
            passthrough(input.num_columns(), &selected)
                .into_iter()
                .map(|i| input.columns[i].clone()),
        );
        Ok(Table::new(columns))
    }
}

/// Population standard deviation; a constant column is only centred.
/// Missing cells (including NaN) are ignored when fitting and come out
/// as `Null`.
pub fn standardize_column(column: &Column) -> Column {
    let present: Vec<f64> = column
        .values
        .iter()
        .filter_map(Scalar::as_f64)
        .filter(|v| !v.is_nan())
        .collect();
    if present.is_empty() {
        return column.clone();
    }
    let n = present.len() as f64;
    let mean = present.iter().sum::<f64>() / n;
    let var = present.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    let scale = if var > 0.0 { var.sqrt() } else { 1.0 };

    let values = column
        .values
        .iter()
        .map(|v| match v.as_f64() {
            Some(x) if !x.is_nan() => Scalar::F64((x - mean) / scale),
            _ => Scalar::Null,
        })
        .collect();
    Column::new(column.name.clone(), values)
}
