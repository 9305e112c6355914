//! Scheme-dispatching loader: `memory://` to the in-memory map, everything
//! else to CSV.

use provflow_core::error::Result as CoreResult;
use provflow_core::source::{SourceDescriptor, SourceLocation, SourceLoader};
use provflow_core::types::Table;

use super::csv::CsvLoader;
use super::memory::MemoryLoader;

#[derive(Debug, Clone, Default)]
pub struct UriLoader {
    pub csv: CsvLoader,
    pub memory: MemoryLoader,
}

impl UriLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_memory(memory: MemoryLoader) -> Self {
        Self {
            csv: CsvLoader::default(),
            memory,
        }
    }
}

impl SourceLoader for UriLoader {
    fn load(&self, source: &SourceDescriptor) -> CoreResult<Table> {
        match source.location() {
            SourceLocation::Memory(_) => self.memory.load(source),
            SourceLocation::File(_) => self.csv.load(source),
        }
    }
}
