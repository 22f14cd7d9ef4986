//! Loader configuration surface.
//!
//! Block-location preloading is the dominant I/O cost of a metadata load
//! and is only useful for schedulers placing work near replicas, so it is
//! switchable per storage scheme or per `scheme://authority`. An authority
//! override always wins over a scheme override, which wins over the
//! default.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::paths;

fn default_true() -> bool {
    true
}

fn default_concurrency() -> usize {
    16
}

/// Configuration consumed by the file metadata loaders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Whether block locations are resolved for new or changed files when
    /// no scheme/authority override applies.
    #[serde(default = "default_true")]
    pub preload_block_locations: bool,

    /// Per-scheme overrides, keyed by scheme (`hdfs`, `s3a`, ...).
    #[serde(default)]
    pub preload_overrides_by_scheme: HashMap<String, bool>,

    /// Per-filesystem overrides, keyed by authority (`namenode:8020`).
    /// Takes precedence over scheme overrides.
    #[serde(default)]
    pub preload_overrides_by_authority: HashMap<String, bool>,

    /// Whether Iceberg content files must reside under the table's
    /// declared root location.
    #[serde(default = "default_true")]
    pub data_files_in_table_location_only: bool,

    /// Upper bound on concurrent block-location resolutions within one load.
    #[serde(default = "default_concurrency")]
    pub resolve_concurrency: usize,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            preload_block_locations: true,
            preload_overrides_by_scheme: HashMap::new(),
            preload_overrides_by_authority: HashMap::new(),
            data_files_in_table_location_only: true,
            resolve_concurrency: default_concurrency(),
        }
    }
}

impl LoadConfig {
    /// Resolves whether block locations should be preloaded for files under
    /// `location`.
    #[must_use]
    pub fn preload_block_locations_for(&self, location: &str) -> bool {
        if let Some(authority) = paths::authority_of(location) {
            if let Some(&enabled) = self.preload_overrides_by_authority.get(authority) {
                return enabled;
            }
        }
        if let Some(scheme) = paths::scheme_of(location) {
            if let Some(&enabled) = self.preload_overrides_by_scheme.get(scheme) {
                return enabled;
            }
        }
        self.preload_block_locations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authority_override_beats_scheme_override() {
        let mut config = LoadConfig::default();
        config
            .preload_overrides_by_scheme
            .insert("hdfs".to_string(), true);
        config
            .preload_overrides_by_authority
            .insert("nn:8020".to_string(), false);

        assert!(!config.preload_block_locations_for("hdfs://nn:8020/warehouse/t"));
        assert!(config.preload_block_locations_for("hdfs://other:8020/warehouse/t"));
    }

    #[test]
    fn scheme_override_beats_default() {
        let mut config = LoadConfig::default();
        config
            .preload_overrides_by_scheme
            .insert("s3a".to_string(), false);

        assert!(!config.preload_block_locations_for("s3a://bucket/warehouse/t"));
        assert!(config.preload_block_locations_for("hdfs://nn:8020/warehouse/t"));
    }
}
