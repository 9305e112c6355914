//! `SourceLoader` implementations.
//!
//! Every loader hands back content with missing-value sentinels already
//! mapped to `Scalar::Null`.

pub mod csv;
pub mod memory;
pub mod uri;

pub use self::csv::CsvLoader;
pub use memory::MemoryLoader;
pub use uri::UriLoader;
