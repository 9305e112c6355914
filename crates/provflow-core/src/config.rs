//! Engine configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// How long the engine waits for the description collaborator before
    /// falling back to the templated description.
    pub describe_timeout_ms: u64,

    /// Neighbour count for nearest-neighbour imputation.
    pub knn_neighbors: usize,

    /// Directory where saved runs are written.
    pub export_dir: String,

    /// Optional directory for JSONL dumps of every produced dataset.
    pub emit_dir: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            describe_timeout_ms: 5_000,
            knn_neighbors: 3,
            export_dir: ".".to_string(),
            emit_dir: None,
        }
    }
}

/// Partial configuration, as found in a pipeline file's `config:` section.
/// Only the fields that are present override the base config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigOverrides {
    pub describe_timeout_ms: Option<u64>,
    pub knn_neighbors: Option<usize>,
    pub export_dir: Option<String>,
    pub emit_dir: Option<String>,
}

impl EngineConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `PROVFLOW_DESCRIBE_TIMEOUT_MS`: description collaborator timeout
    /// - `PROVFLOW_KNN_NEIGHBORS`: neighbour count for imputation
    /// - `PROVFLOW_EXPORT_DIR`: directory for saved runs
    /// - `PROVFLOW_EMIT_DIR`: directory for JSONL dataset dumps
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("PROVFLOW_DESCRIBE_TIMEOUT_MS") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.describe_timeout_ms = v;
            }
        }

        if let Ok(s) = std::env::var("PROVFLOW_KNN_NEIGHBORS") {
            if let Ok(v) = s.parse::<usize>() {
                if v > 0 {
                    cfg.knn_neighbors = v;
                }
            }
        }

        if let Ok(s) = std::env::var("PROVFLOW_EXPORT_DIR") {
            cfg.export_dir = s;
        }

        if let Ok(s) = std::env::var("PROVFLOW_EMIT_DIR") {
            cfg.emit_dir = Some(s);
        }

        cfg
    }

    /// Apply the fields present in `overrides`.
    pub fn apply(&mut self, overrides: &ConfigOverrides) {
        if let Some(v) = overrides.describe_timeout_ms {
            self.describe_timeout_ms = v;
        }
        if let Some(v) = overrides.knn_neighbors.filter(|v| *v > 0) {
            self.knn_neighbors = v;
        }
        if let Some(v) = &overrides.export_dir {
            self.export_dir = v.clone();
        }
        if let Some(v) = &overrides.emit_dir {
            self.emit_dir = Some(v.clone());
        }
    }

    pub fn describe_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.describe_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_only_touch_present_fields() {
        let mut cfg = EngineConfig::default();
        cfg.apply(&ConfigOverrides {
            knn_neighbors: Some(5),
            ..Default::default()
        });
        assert_eq!(cfg.knn_neighbors, 5);
        assert_eq!(cfg.describe_timeout_ms, 5_000);
        assert_eq!(cfg.export_dir, ".");
    }

    #[test]
    fn zero_neighbours_is_ignored() {
        let mut cfg = EngineConfig::default();
        cfg.apply(&ConfigOverrides {
            knn_neighbors: Some(0),
            ..Default::default()
        });
        assert_eq!(cfg.knn_neighbors, 3);
    }
}
