//! Reference-column selectors and their resolution against input columns.

use serde::{Deserialize, Serialize};

use crate::traits::OpError;

/// Columns a step refers to. `columns_1` applies to the first input,
/// `columns_2` to the second (Merge only).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub columns_1: Vec<String>,
    pub columns_2: Vec<String>,
}

impl Selectors {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn columns<S: AsRef<str>>(cols: &[S]) -> Self {
        Self {
            columns_1: cols.iter().map(|c| c.as_ref().to_string()).collect(),
            columns_2: Vec::new(),
        }
    }

    pub fn pairs<S: AsRef<str>>(left: &[S], right: &[S]) -> Self {
        Self {
            columns_1: left.iter().map(|c| c.as_ref().to_string()).collect(),
            columns_2: right.iter().map(|c| c.as_ref().to_string()).collect(),
        }
    }
}

/// Resolve selected names to column indices, in selection order. Repeated
/// names are kept once.
pub(crate) fn resolve(available: &[String], selection: &[String]) -> Result<Vec<usize>, OpError> {
    let mut out: Vec<usize> = Vec::with_capacity(selection.len());
    for name in selection {
        let idx = available
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| OpError::Selection(format!("column '{name}' not found in input")))?;
        if !out.contains(&idx) {
            out.push(idx);
        }
    }
    Ok(out)
}

/// Like `resolve`, but an empty selection means every column.
pub(crate) fn resolve_or_all(
    available: &[String],
    selection: &[String],
) -> Result<Vec<usize>, OpError> {
    if selection.is_empty() {
        Ok((0..available.len()).collect())
    } else {
        resolve(available, selection)
    }
}

/// Indices not in `selected`, in input order.
pub(crate) fn passthrough(num_columns: usize, selected: &[usize]) -> Vec<usize> {
    (0..num_columns).filter(|i| !selected.contains(i)).collect()
}
