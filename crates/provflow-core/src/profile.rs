//! Profiling collaborator interface.
//!
//! The profiler owns dataset identity: the registry treats the returned hash
//! as the dataset id and never computes one itself. Statistical profiling
//! proper is out of scope; the bundled `ContentProfiler` only records the
//! per-column counts it gets for free while hashing.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hash::{hash_table, Hash256};
use crate::types::Table;

/// Opaque profile reference attached to a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub data: serde_json::Value,
}

/// Output of `Profiler::profile`.
#[derive(Debug, Clone)]
pub struct ProfileOutput {
    pub hash: Hash256,
    pub profile: Profile,
}

pub trait Profiler: Send + Sync {
    /// Must be deterministic: identical content yields an identical hash.
    fn profile(&self, content: &Table) -> Result<ProfileOutput>;
}

/// Default profiler: blake3 over the canonical cell encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentProfiler;

impl Profiler for ContentProfiler {
    fn profile(&self, content: &Table) -> Result<ProfileOutput> {
        let columns: Vec<serde_json::Value> = content
            .columns
            .iter()
            .map(|c| {
                serde_json::json!({
                    "name": c.name,
                    "missing": c.null_count(),
                })
            })
            .collect();
        Ok(ProfileOutput {
            hash: hash_table(content),
            profile: Profile {
                data: serde_json::json!({
                    "rows": content.num_rows(),
                    "columns": columns,
                }),
            },
        })
    }
}
