//! Source descriptors and the content-loading collaborator.

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::Table;

/// Where a raw node's content comes from, written as a URI.
///
/// `file://path` and bare paths name CSV files; `memory://key` names a table
/// held by an in-memory loader. Two raw nodes with equal descriptors are the
/// same source.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceDescriptor(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceLocation {
    File(PathBuf),
    Memory(String),
}

impl SourceDescriptor {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn memory(key: &str) -> Self {
        Self(format!("memory://{key}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn location(&self) -> SourceLocation {
        if let Some(key) = self.0.strip_prefix("memory://") {
            SourceLocation::Memory(key.to_string())
        } else if let Some(path) = self.0.strip_prefix("file://") {
            SourceLocation::File(PathBuf::from(path))
        } else {
            SourceLocation::File(PathBuf::from(&self.0))
        }
    }
}

impl fmt::Display for SourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SourceDescriptor {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Content-loading collaborator.
///
/// Implementations must map every missing-value sentinel to `Scalar::Null`
/// before returning.
pub trait SourceLoader: Send + Sync {
    fn load(&self, source: &SourceDescriptor) -> Result<Table>;
}
