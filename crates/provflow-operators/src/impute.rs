//! ImputeMissing: nearest-neighbour imputation for numeric columns and
//! most-frequent imputation for categorical ones.
//!
//! Output order is imputed-numeric, imputed-categorical, then the unselected
//! columns in input order.

use std::collections::HashMap;

use provflow_core::types::{scalar_cmp, Column, Scalar, ScalarKey, Table};

use crate::feature::{FeatureType, FeatureTyper};
use crate::plan::TransformPlan;
use crate::select::{passthrough, resolve, Selectors};
use crate::traits::{expect_inputs, OpError, Transform};

#[derive(Debug, Clone, Copy)]
pub struct ImputeMissing {
    /// Neighbour count. Clamped to the number of eligible donor rows.
    pub neighbors: usize,
}

impl Default for ImputeMissing {
    fn default() -> Self {
        Self { neighbors: 3 }
    }
}

impl ImputeMissing {
    pub fn new(neighbors: usize) -> Self {
        Self {
            neighbors: neighbors.max(1),
        }
    }

    fn selection(columns: &[String], selectors: &Selectors) -> Result<Vec<usize>, OpError> {
        if selectors.columns_1.is_empty() {
            return Err(OpError::Selection(
                "impute_missing requires at least one selected column".into(),
            ));
        }
        resolve(columns, &selectors.columns_1)
    }
}

impl Transform for ImputeMissing {
    fn name(&self) -> &'static str {
        "impute_missing"
    }

    fn arity(&self) -> usize {
        1
    }

    fn plan(&self, inputs: &[&[String]], selectors: &Selectors) -> Result<TransformPlan, OpError> {
        expect_inputs(self.name(), 1, inputs)?;
        Self::selection(inputs[0], selectors)?;
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
        let selected = Self::selection(&input.column_names(), selectors)?;

        let (numeric, categorical): (Vec<usize>, Vec<usize>) = selected
            .iter()
            .partition(|&&i| typer.feature_type(&input.columns[i]) == FeatureType::Numeric);

        let numeric_cols: Vec<&Column> = numeric.iter().map(|&i| &input.columns[i]).collect();
        let mut columns = knn_impute(&numeric_cols, self.neighbors);
        columns.extend(categorical.iter().map(|&i| mode_impute(&input.columns[i])));
        columns.extend(
            passthrough(input.num_columns(), &selected)
                .into_iter()
                .map(|i| input.columns[i].clone()),
        );
        Ok(Table::new(columns))
    }
}

/// KNN imputation over a block of numeric columns.
///
/// Distances use the nan-euclidean metric over the block. Donors for a cell
/// are other rows where that column is present and that share at least one
/// present coordinate with the receiver; ties go to the earlier row. With no
/// donor the column mean is used. All-missing columns come back unchanged.
pub fn knn_impute(columns: &[&Column], k: usize) -> Vec<Column> {
    let n_rows = columns.first().map(|c| c.len()).unwrap_or(0);
    let data: Vec<Vec<Option<f64>>> = (0..n_rows)
        .map(|r| {
            columns
                .iter()
                .map(|c| c.values[r].as_f64().filter(|v| !v.is_nan()))
                .collect()
        })
        .collect();

    columns
        .iter()
        .enumerate()
        .map(|(j, col)| {
            let present: Vec<f64> = data.iter().filter_map(|row| row[j]).collect();
            if present.is_empty() {
                return (*col).clone();
            }
            let mean = present.iter().sum::<f64>() / present.len() as f64;

            let values = (0..n_rows)
                .map(|r| match data[r][j] {
                    Some(v) => Scalar::F64(v),
                    None => Scalar::F64(impute_cell(&data, r, j, k).unwrap_or(mean)),
                })
                .collect();
            Column::new(col.name.clone(), values)
        })
        .collect()
}

fn impute_cell(data: &[Vec<Option<f64>>], receiver: usize, col: usize, k: usize) -> Option<f64> {
    let mut donors: Vec<(f64, usize)> = data
        .iter()
        .enumerate()
        .filter(|(d, row)| *d != receiver && row[col].is_some())
        .filter_map(|(d, row)| nan_euclidean(&data[receiver], row).map(|dist| (dist, d)))
        .collect();
    donors.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

    let take = k.min(donors.len());
    if take == 0 {
        return None;
    }
    let sum: f64 = donors[..take]
        .iter()
        .filter_map(|(_, d)| data[*d][col])
        .sum();
    Some(sum / take as f64)
}

/// `sqrt(n_total / n_present * Σ (a - b)²)` over coordinates present in both
/// rows; `None` when no coordinate is shared.
pub fn nan_euclidean(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let mut present = 0usize;
    let mut sum = 0.0;
    for (x, y) in a.iter().zip(b) {
        if let (Some(x), Some(y)) = (x, y) {
            present += 1;
            sum += (x - y) * (x - y);
        }
    }
    if present == 0 {
        return None;
    }
    Some((a.len() as f64 / present as f64 * sum).sqrt())
}

/// Fill missing cells with the most frequent value; ties go to the smallest
/// value under the scalar order.
pub fn mode_impute(column: &Column) -> Column {
    let mut counts: HashMap<ScalarKey, (&Scalar, usize)> = HashMap::new();
    for v in column.values.iter().filter(|v| !v.is_null()) {
        counts.entry(v.key()).or_insert((v, 0)).1 += 1;
    }
    let mode = counts
        .into_values()
        .max_by(|(va, ca), (vb, cb)| ca.cmp(cb).then_with(|| scalar_cmp(vb, va)))
        .map(|(v, _)| v.clone());

    let Some(mode) = mode else {
        return column.clone();
    };
    let values = column
        .values
        .iter()
        .map(|v| if v.is_null() { mode.clone() } else { v.clone() })
        .collect();
    Column::new(column.name.clone(), values)
}
