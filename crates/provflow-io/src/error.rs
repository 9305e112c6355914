use provflow_core::error::Error as CoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("unreadable run file {}: {source}", path.display())]
    Unreadable {
        path: std::path::PathBuf,
        #[source]
        source: Box<Error>,
    },

    #[error("{0} lock poisoned")]
    Poisoned(&'static str),
}

impl Error {
    /// Report this error as a failure of the named collaborator.
    pub fn into_collaborator(self, collaborator: &'static str) -> CoreError {
        CoreError::collaborator(collaborator, self)
    }
}
