//! Per-load counters shared across parallel reconciliation workers.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters accumulated during one load invocation.
///
/// Workers reconciling files in parallel update the counters atomically;
/// no ordering between updates is required. Stats are reset per load by
/// construction (each load owns a fresh instance) and are never persisted.
#[derive(Debug, Default)]
pub struct LoadStats {
    loaded_files: AtomicU64,
    skipped_files: AtomicU64,
    files_superseded_by_acid_state: AtomicU64,
}

impl LoadStats {
    /// Creates zeroed counters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one freshly constructed descriptor.
    pub fn record_loaded(&self) {
        self.loaded_files.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one reused descriptor.
    pub fn record_skipped(&self) {
        self.skipped_files.fetch_add(1, Ordering::Relaxed);
    }

    /// Records `count` files excluded because a compacted file supersedes them.
    pub fn record_superseded(&self, count: u64) {
        self.files_superseded_by_acid_state
            .fetch_add(count, Ordering::Relaxed);
    }

    /// Number of freshly constructed descriptors.
    #[must_use]
    pub fn loaded_files(&self) -> u64 {
        self.loaded_files.load(Ordering::Relaxed)
    }

    /// Number of reused descriptors.
    #[must_use]
    pub fn skipped_files(&self) -> u64 {
        self.skipped_files.load(Ordering::Relaxed)
    }

    /// Number of files excluded by ACID supersession.
    #[must_use]
    pub fn files_superseded_by_acid_state(&self) -> u64 {
        self.files_superseded_by_acid_state.load(Ordering::Relaxed)
    }

    /// Takes an immutable snapshot of the counters.
    #[must_use]
    pub fn snapshot(&self) -> LoadStatsSnapshot {
        LoadStatsSnapshot {
            loaded_files: self.loaded_files(),
            skipped_files: self.skipped_files(),
            files_superseded_by_acid_state: self.files_superseded_by_acid_state(),
        }
    }
}

/// Immutable view of [`LoadStats`] returned with every load result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LoadStatsSnapshot {
    /// Number of freshly constructed descriptors.
    pub loaded_files: u64,
    /// Number of reused descriptors.
    pub skipped_files: u64,
    /// Number of files excluded by ACID supersession.
    pub files_superseded_by_acid_state: u64,
}
