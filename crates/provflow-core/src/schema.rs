//! Dataset schemas: ordered columns with declared types plus shape.

use serde::{Deserialize, Serialize};

use crate::types::{Column, Scalar, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Boolean,
    Int64,
    Float64,
    Utf8,
}

impl DataType {
    /// Declared type of a column, inferred from its non-missing values.
    ///
    /// All bool → Boolean, all integer → Int64, numeric with any float →
    /// Float64, anything else → Utf8. A column with no values at all is
    /// Float64 (an all-missing numeric column).
    pub fn infer(column: &Column) -> DataType {
        let mut seen_int = false;
        let mut seen_float = false;
        let mut seen_bool = false;
        let mut seen_text = false;
        for v in &column.values {
            match v {
                Scalar::Null => {}
                Scalar::Bool(_) => seen_bool = true,
                Scalar::I64(_) => seen_int = true,
                Scalar::F64(_) => seen_float = true,
                Scalar::Str(_) => seen_text = true,
            }
        }
        match (seen_bool, seen_int, seen_float, seen_text) {
            (_, _, _, true) => DataType::Utf8,
            (true, false, false, false) => DataType::Boolean,
            (true, _, _, _) => DataType::Utf8,
            (false, true, false, false) => DataType::Int64,
            (false, _, _, false) => DataType::Float64,
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, DataType::Int64 | DataType::Float64)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub fields: Vec<Field>,
    pub num_rows: usize,
    pub num_columns: usize,
}

impl Schema {
    /// Extract the schema (column names, declared types, shape) of a table.
    pub fn of(table: &Table) -> Self {
        let fields: Vec<Field> = table
            .columns
            .iter()
            .map(|c| Field::new(c.name.clone(), DataType::infer(c)))
            .collect();
        Self {
            num_columns: fields.len(),
            num_rows: table.num_rows(),
            fields,
        }
    }

    pub fn field(&self, idx: usize) -> Option<&Field> {
        self.fields.get(idx)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infers_declared_types() {
        let t = Table::from_rows(
            &["i", "f", "s", "b", "missing", "mixed"],
            vec![
                vec![
                    Scalar::I64(1),
                    Scalar::F64(1.5),
                    Scalar::Str("x".into()),
                    Scalar::Bool(true),
                    Scalar::Null,
                    Scalar::I64(1),
                ],
                vec![
                    Scalar::Null,
                    Scalar::I64(2),
                    Scalar::Null,
                    Scalar::Bool(false),
                    Scalar::Null,
                    Scalar::Str("y".into()),
                ],
            ],
        );
        let schema = Schema::of(&t);
        let types: Vec<DataType> = schema.fields.iter().map(|f| f.data_type).collect();
        assert_eq!(
            types,
            vec![
                DataType::Int64,
                DataType::Float64,
                DataType::Utf8,
                DataType::Boolean,
                DataType::Float64,
                DataType::Utf8,
            ]
        );
        assert_eq!(schema.num_rows, 2);
        assert_eq!(schema.num_columns, 6);
    }
}
