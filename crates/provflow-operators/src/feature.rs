//! Feature-type inference: NUMERIC or CATEGORICAL per column.

use provflow_core::types::Column;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeatureType {
    Numeric,
    Categorical,
}

/// Type-inference collaborator. Must be pure and total.
pub trait FeatureTyper: Send + Sync {
    fn feature_type(&self, column: &Column) -> FeatureType;
}

/// NUMERIC iff every non-missing value is an integer or a float. An
/// all-missing column is NUMERIC.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueFeatureTyper;

impl FeatureTyper for ValueFeatureTyper {
    fn feature_type(&self, column: &Column) -> FeatureType {
        let numeric = column
            .values
            .iter()
            .filter(|v| !v.is_null())
            .all(|v| v.is_numeric());
        if numeric {
            FeatureType::Numeric
        } else {
            FeatureType::Categorical
        }
    }
}
