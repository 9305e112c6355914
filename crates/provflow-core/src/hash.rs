//! Stable hashing helpers for content-addressable datasets.

use blake3::Hasher;

use crate::types::{Scalar, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    pub fn to_hex(&self) -> String {
        // blake3 hex(32b) is 64 hex chars
        let mut s = String::with_capacity(64);
        for b in &self.0 {
            use std::fmt::Write as _;
            let _ = write!(&mut s, "{:02x}", b);
        }
        s
    }
}

impl std::fmt::Display for Hash256 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// Deterministic content hash of a table.
///
/// Covers column count, column names (in order), row count and every cell
/// with a type discriminant, so two tables hash equal iff they are
/// `Table::same_content`.
pub fn hash_table(table: &Table) -> Hash256 {
    let mut h = Hasher::new();
    h.update(&(table.columns.len() as u64).to_le_bytes());
    h.update(&(table.num_rows() as u64).to_le_bytes());
    for col in &table.columns {
        h.update(&(col.name.len() as u64).to_le_bytes());
        h.update(col.name.as_bytes());
        h.update(&(col.values.len() as u64).to_le_bytes());
        for v in &col.values {
            hash_scalar(v, &mut h);
        }
    }
    Hash256(h.finalize().into())
}

/// Hash a scalar value into a hasher. Strings are length-prefixed so that
/// adjacent cells cannot alias.
pub(crate) fn hash_scalar(scalar: &Scalar, hasher: &mut Hasher) {
    use Scalar::*;

    hasher.update(&[scalar.type_order()]);

    match scalar {
        Null => {}
        Bool(b) => {
            hasher.update(&[*b as u8]);
        }
        I64(i) => {
            hasher.update(&i.to_le_bytes());
        }
        F64(f) => {
            hasher.update(&crate::types::canonical_bits(*f).to_le_bytes());
        }
        Str(s) => {
            hasher.update(&(s.len() as u64).to_le_bytes());
            hasher.update(s.as_bytes());
        }
    }
}
