//! `RunStore` implementations.
//!
//! - `fs`: one pretty-printed export document per run in a directory.
//! - `memory`: documents in a map, for tests and embedders.

mod fs;
mod memory;

pub use fs::FsRunStore;
pub use memory::MemoryRunStore;
