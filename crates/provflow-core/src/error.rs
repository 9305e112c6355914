use thiserror::Error;

use crate::id::NodeId;

/// Canonical result for core.
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline-wide error taxonomy.
///
/// Structural variants (`InvalidTopology`, `InvalidColumnSelection`,
/// `DuplicateSource`) are raised before any side effect happens.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid topology{}: {cause}", fmt_node(.node))]
    InvalidTopology { node: Option<NodeId>, cause: String },

    #[error("invalid column selection: {0}")]
    InvalidColumnSelection(String),

    #[error("duplicate source: {0}")]
    DuplicateSource(String),

    #[error("empty result: {0}")]
    EmptyResult(String),

    #[error("{collaborator} collaborator failed: {cause}")]
    CollaboratorFailure {
        collaborator: &'static str,
        cause: String,
    },

    #[error("internal invariant failed: {0}")]
    Invariant(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn topology(node: impl Into<Option<NodeId>>, cause: impl Into<String>) -> Self {
        Error::InvalidTopology {
            node: node.into(),
            cause: cause.into(),
        }
    }

    pub fn collaborator(collaborator: &'static str, cause: impl ToString) -> Self {
        Error::CollaboratorFailure {
            collaborator,
            cause: cause.to_string(),
        }
    }

    /// Short stable name of the variant, used in logs and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidTopology { .. } => "InvalidTopology",
            Error::InvalidColumnSelection(_) => "InvalidColumnSelection",
            Error::DuplicateSource(_) => "DuplicateSource",
            Error::EmptyResult(_) => "EmptyResult",
            Error::CollaboratorFailure { .. } => "CollaboratorFailure",
            Error::Invariant(_) => "Invariant",
            Error::Io(_) => "Io",
            Error::Json(_) => "Json",
        }
    }
}

fn fmt_node(node: &Option<NodeId>) -> String {
    match node {
        Some(n) => format!(" at {n}"),
        None => String::new(),
    }
}
