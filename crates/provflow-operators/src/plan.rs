//! Planning surface: the column preview a transform returns before running.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformPlan {
    pub output_columns: Vec<String>,

    /// False when only the column *set* is known in advance (transforms whose
    /// output order depends on inferred feature types).
    pub ordered: bool,
}

impl TransformPlan {
    pub fn ordered(output_columns: Vec<String>) -> Self {
        Self {
            output_columns,
            ordered: true,
        }
    }

    pub fn unordered(output_columns: Vec<String>) -> Self {
        Self {
            output_columns,
            ordered: false,
        }
    }
}
