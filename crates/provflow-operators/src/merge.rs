//! Merge: inner join of two inputs on paired reference columns.
//!
//! Reference column i of the first input is matched against reference
//! column i of the second. Rows come out in left order, each followed by its
//! matching right rows in right order. Missing keys match each other.

use std::collections::HashMap;

use provflow_core::types::{Column, ScalarKey, Table};

use crate::feature::FeatureTyper;
use crate::plan::TransformPlan;
use crate::select::{resolve, Selectors};
use crate::traits::{expect_inputs, OpError, Transform};

#[derive(Debug, Clone, Copy, Default)]
pub struct Merge;

/// Output layout of a merge, computed from column names only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeLayout {
    pub left_keys: Vec<usize>,
    pub right_keys: Vec<usize>,
    /// Right columns that appear in the output (same-named key partners are
    /// folded into the left column).
    pub right_kept: Vec<usize>,
    pub output_columns: Vec<String>,
}

impl MergeLayout {
    pub fn new(left: &[String], right: &[String], selectors: &Selectors) -> Result<Self, OpError> {
        let (l, r) = (&selectors.columns_1, &selectors.columns_2);
        if l.is_empty() || r.is_empty() {
            return Err(OpError::Selection(
                "merge needs at least one reference column on each side".into(),
            ));
        }
        if l.len() != r.len() {
            return Err(OpError::Selection(format!(
                "merge reference lists differ in length ({} vs {})",
                l.len(),
                r.len()
            )));
        }
        let left_keys = resolve_pairs(left, l)?;
        let right_keys = resolve_pairs(right, r)?;

        let shared_keys: Vec<usize> = left_keys
            .iter()
            .zip(&right_keys)
            .filter(|(li, ri)| left[**li] == right[**ri])
            .map(|(_, ri)| *ri)
            .collect();
        let right_kept: Vec<usize> = (0..right.len())
            .filter(|i| !shared_keys.contains(i))
            .collect();

        let overlaps = |name: &String| {
            left.contains(name) && right_kept.iter().any(|&i| &right[i] == name)
        };
        let mut output_columns: Vec<String> = left
            .iter()
            .map(|n| if overlaps(n) { format!("{n}_x") } else { n.clone() })
            .collect();
        output_columns.extend(right_kept.iter().map(|&i| {
            let n = &right[i];
            if overlaps(n) {
                format!("{n}_y")
            } else {
                n.clone()
            }
        }));

        Ok(Self {
            left_keys,
            right_keys,
            right_kept,
            output_columns,
        })
    }
}

/// Key lists may repeat a column, so resolve each entry on its own.
fn resolve_pairs(available: &[String], selection: &[String]) -> Result<Vec<usize>, OpError> {
    selection
        .iter()
        .map(|name| resolve(available, std::slice::from_ref(name)).map(|v| v[0]))
        .collect()
}

impl Transform for Merge {
    fn name(&self) -> &'static str {
        "merge"
    }

    fn arity(&self) -> usize {
        2
    }

    fn plan(&self, inputs: &[&[String]], selectors: &Selectors) -> Result<TransformPlan, OpError> {
        expect_inputs(self.name(), 2, inputs)?;
        let layout = MergeLayout::new(inputs[0], inputs[1], selectors)?;
        Ok(TransformPlan::ordered(layout.output_columns))
    }

    fn eval(
        &self,
        inputs: &[&Table],
        selectors: &Selectors,
        _typer: &dyn FeatureTyper,
    ) -> Result<Table, OpError> {
        expect_inputs(self.name(), 2, inputs)?;
        let (left, right) = (inputs[0], inputs[1]);
        let layout = MergeLayout::new(&left.column_names(), &right.column_names(), selectors)?;

        let key_of = |t: &Table, keys: &[usize], row: usize| -> Vec<ScalarKey> {
            keys.iter().map(|&k| t.columns[k].values[row].key()).collect()
        };

        let mut index: HashMap<Vec<ScalarKey>, Vec<usize>> = HashMap::new();
        for r in 0..right.num_rows() {
            index
                .entry(key_of(right, &layout.right_keys, r))
                .or_default()
                .push(r);
        }

        let mut left_rows = Vec::new();
        let mut right_rows = Vec::new();
        for l in 0..left.num_rows() {
            if let Some(matches) = index.get(&key_of(left, &layout.left_keys, l)) {
                for &r in matches {
                    left_rows.push(l);
                    right_rows.push(r);
                }
            }
        }

        let mut names = layout.output_columns.into_iter();
        let mut columns = Vec::with_capacity(left.num_columns() + layout.right_kept.len());
        for col in &left.columns {
            let values = left_rows.iter().map(|&i| col.values[i].clone()).collect();
            columns.push(Column::new(names.next().unwrap_or_default(), values));
        }
        for &ci in &layout.right_kept {
            let col = &right.columns[ci];
            let values = right_rows.iter().map(|&i| col.values[i].clone()).collect();
            columns.push(Column::new(names.next().unwrap_or_default(), values));
        }
        Ok(Table::new(columns))
    }
}
