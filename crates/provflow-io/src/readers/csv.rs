//! CSV loader with missing-value normalisation and per-column typing.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use provflow_core::error::Result as CoreResult;
use provflow_core::source::{SourceDescriptor, SourceLocation, SourceLoader};
use provflow_core::types::{Column, Scalar, Table};

use crate::error::{Error, Result};

/// Cells that mean "missing".
pub const MISSING_SENTINELS: &[&str] = &["", "NA", "N/A", "NaN", "nan", "null", "NULL", "None", "#N/A"];

#[derive(Debug, Clone, Copy)]
pub struct CsvLoader {
    pub delimiter: u8,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn read_path(&self, path: &Path) -> Result<Table> {
        let file = File::open(path)?;
        let table = self.read(file)?;
        tracing::debug!(
            path = %path.display(),
            rows = table.num_rows(),
            columns = table.num_columns(),
            "csv loaded"
        );
        Ok(table)
    }

    /// Parse CSV with a header row. Short rows are padded with missing cells.
    pub fn read<R: Read>(&self, reader: R) -> Result<Table> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .delimiter(self.delimiter)
            .from_reader(reader);

        let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let mut raw: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
        for record in rdr.records() {
            let record = record?;
            for (i, col) in raw.iter_mut().enumerate() {
                let cell = record.get(i).unwrap_or("");
                col.push(if is_missing(cell) {
                    None
                } else {
                    Some(cell.to_string())
                });
            }
        }

        let columns = headers
            .into_iter()
            .zip(raw)
            .map(|(name, cells)| Column::new(name, type_column(cells)))
            .collect();
        Ok(Table::new(columns))
    }
}

pub fn is_missing(cell: &str) -> bool {
    MISSING_SENTINELS.contains(&cell.trim())
}

/// One type per column: all integers → I64; numbers with any float → F64;
/// all booleans → Bool; anything else → the original text.
fn type_column(cells: Vec<Option<String>>) -> Vec<Scalar> {
    let present = || cells.iter().flatten().map(|s| s.trim());

    if present().all(|s| s.parse::<i64>().is_ok()) {
        return cells
            .iter()
            .map(|c| match c.as_deref().map(|s| s.trim().parse::<i64>()) {
                Some(Ok(v)) => Scalar::I64(v),
                _ => Scalar::Null,
            })
            .collect();
    }
    if present().all(|s| s.parse::<f64>().is_ok()) {
        return cells
            .iter()
            .map(|c| match c.as_deref().map(|s| s.trim().parse::<f64>()) {
                Some(Ok(v)) => Scalar::F64(v),
                _ => Scalar::Null,
            })
            .collect();
    }
    if present().all(|s| parse_bool(s).is_some()) {
        return cells
            .iter()
            .map(|c| match c.as_deref().and_then(parse_bool) {
                Some(b) => Scalar::Bool(b),
                None => Scalar::Null,
            })
            .collect();
    }
    cells
        .into_iter()
        .map(|c| c.map(Scalar::Str).unwrap_or(Scalar::Null))
        .collect()
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim() {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}

impl SourceLoader for CsvLoader {
    fn load(&self, source: &SourceDescriptor) -> CoreResult<Table> {
        match source.location() {
            SourceLocation::File(path) => self
                .read_path(&path)
                .map_err(|e| e.into_collaborator("source loader")),
            SourceLocation::Memory(key) => Err(Error::NotFound(format!(
                "csv loader cannot read memory://{key}"
            ))
            .into_collaborator("source loader")),
        }
    }
}
