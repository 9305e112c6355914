#![forbid(unsafe_code)]
//! provflow-io: the I/O side of the external collaborators.
//!
//! - `readers`: `SourceLoader` implementations (CSV, in-memory, URI dispatch).
//! - `writers`: JSONL dumps of produced datasets.
//! - `store`: `RunStore` implementations (filesystem, in-memory).
//!
//! Everything here is synchronous; the engine calls loaders during a run and
//! stores only at explicit save/load boundaries.

pub mod error;
pub mod readers;
pub mod store;
pub mod writers;

pub use error::{Error, Result};
pub use readers::{CsvLoader, MemoryLoader, UriLoader};
pub use store::{FsRunStore, MemoryRunStore};
pub use writers::JsonlWriter;
