//! NDJSON writer: one JSON object per row.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use provflow_core::types::{Scalar, Table};
use serde_json::{Map, Value};

use crate::error::Result;

pub struct JsonlWriter<W: Write> {
    writer: BufWriter<W>,
}

impl JsonlWriter<File> {
    pub fn to_path(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let f = File::create(path)?;
        Ok(Self::to_writer(f))
    }
}

impl<W: Write> JsonlWriter<W> {
    pub fn to_writer(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
        }
    }

    /// Write every row of `table` and flush.
    pub fn write_table(&mut self, table: &Table) -> Result<()> {
        for r in 0..table.num_rows() {
            let mut obj = Map::new();
            for col in &table.columns {
                let val = col.values.get(r).unwrap_or(&Scalar::Null);
                obj.insert(col.name.clone(), scalar_to_json(val));
            }
            let line = serde_json::to_string(&Value::Object(obj))?;
            writeln!(self.writer, "{}", line)?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| crate::error::Error::Io(e.into_error()))
    }
}

fn scalar_to_json(v: &Scalar) -> Value {
    match v {
        Scalar::Null => Value::Null,
        Scalar::Bool(b) => Value::Bool(*b),
        Scalar::I64(i) => Value::from(*i),
        // Non-finite floats have no JSON form and come out as null.
        Scalar::F64(f) => Value::from(*f),
        Scalar::Str(s) => Value::String(s.clone()),
    }
}
