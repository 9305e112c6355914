//! The closed set of transformation kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::traits::OpError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    Deduplicate,
    ImputeMissing,
    Merge,
    Standardize,
    Encode,
}

impl TransformKind {
    pub const ALL: [TransformKind; 5] = [
        TransformKind::Deduplicate,
        TransformKind::ImputeMissing,
        TransformKind::Merge,
        TransformKind::Standardize,
        TransformKind::Encode,
    ];

    pub fn arity(self) -> usize {
        match self {
            TransformKind::Merge => 2,
            TransformKind::Deduplicate
            | TransformKind::ImputeMissing
            | TransformKind::Standardize
            | TransformKind::Encode => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TransformKind::Deduplicate => "deduplicate",
            TransformKind::ImputeMissing => "impute_missing",
            TransformKind::Merge => "merge",
            TransformKind::Standardize => "standardize",
            TransformKind::Encode => "encode",
        }
    }

    /// Human title shown in editors and reports.
    pub fn label(self) -> &'static str {
        match self {
            TransformKind::Deduplicate => "Deduplicate",
            TransformKind::ImputeMissing => "Impute Missing Values",
            TransformKind::Merge => "Merge",
            TransformKind::Standardize => "Standardization",
            TransformKind::Encode => "Encode Category Features",
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformKind {
    type Err = OpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TransformKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| OpError::Exec(format!("unknown transformation kind '{s}'")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_parse_back() {
        for k in TransformKind::ALL {
            assert_eq!(k.as_str().parse::<TransformKind>().unwrap(), k);
        }
        assert!("pivot".parse::<TransformKind>().is_err());
    }

    #[test]
    fn serde_uses_snake_case() {
        let json = serde_json::to_string(&TransformKind::ImputeMissing).unwrap();
        assert_eq!(json, "\"impute_missing\"");
    }

    #[test]
    fn only_merge_is_binary() {
        for k in TransformKind::ALL {
            let expected = if k == TransformKind::Merge { 2 } else { 1 };
            assert_eq!(k.arity(), expected);
        }
    }
}
