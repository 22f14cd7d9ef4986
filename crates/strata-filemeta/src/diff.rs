//! The reuse-or-reload contract shared by every loader variant.
//!
//! Given the descriptor from a prior load (if any) and the currently
//! observed file stat, [`DiffEngine::reconcile`] decides whether the old
//! descriptor can be reused. Reuse requires the relative path, size, and
//! modification time to all match. Block-location resolution is the
//! expensive part of a load and is never repeated for a reused descriptor.
//!
//! A path present only in the old set and absent from the new observation
//! is dropped silently: it contributes to neither counter and never
//! reaches this engine.

use std::sync::Arc;

use strata_core::config::LoadConfig;
use strata_core::descriptor::{FileBlock, FileDescriptor, FileFormat};
use strata_core::error::Result;
use strata_core::host_index::HostIndex;
use strata_core::stats::LoadStats;
use strata_core::storage::StorageClient;

/// A file observation from a listing or a manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFileStat {
    /// Fully qualified path of the file.
    pub absolute_path: String,
    /// Path relative to the table (or enclosing storage) root.
    pub relative_path: String,
    /// Size in bytes.
    pub size: u64,
    /// Storage-supplied modification timestamp (logical clock).
    pub modification_time: i64,
}

/// Reconciles observed files against prior descriptors.
///
/// One engine is built per load; it shares the load's [`LoadStats`] and
/// the session's [`HostIndex`]. Each call is atomic with respect to a
/// single file: a cancelled load never yields a partially reconciled
/// descriptor.
pub struct DiffEngine {
    storage: Arc<dyn StorageClient>,
    host_index: Arc<HostIndex>,
    stats: Arc<LoadStats>,
    config: LoadConfig,
    format: Option<FileFormat>,
}

impl DiffEngine {
    /// Creates an engine for one load.
    #[must_use]
    pub fn new(
        storage: Arc<dyn StorageClient>,
        host_index: Arc<HostIndex>,
        stats: Arc<LoadStats>,
        config: LoadConfig,
        format: Option<FileFormat>,
    ) -> Self {
        Self {
            storage,
            host_index,
            stats,
            config,
            format,
        }
    }

    /// Decides reuse vs. reload for one observed file.
    ///
    /// Returns the descriptor to carry forward and whether it was reused.
    /// Updates `loaded_files` or `skipped_files` on the load's stats.
    ///
    /// # Errors
    ///
    /// Propagates storage failures from block-location resolution.
    pub async fn reconcile(
        &self,
        old: Option<&FileDescriptor>,
        observed: &RawFileStat,
    ) -> Result<(FileDescriptor, bool)> {
        if let Some(old) = old {
            if old.relative_path() == observed.relative_path
                && old.is_unchanged(observed.size, observed.modification_time)
            {
                self.stats.record_skipped();
                return Ok((old.clone(), true));
            }
        }

        let blocks = if self
            .config
            .preload_block_locations_for(&observed.absolute_path)
        {
            self.resolve_blocks(&observed.absolute_path).await?
        } else {
            Vec::new()
        };

        self.stats.record_loaded();
        Ok((
            FileDescriptor::new(
                observed.relative_path.clone(),
                observed.absolute_path.clone(),
                observed.size,
                observed.modification_time,
                blocks,
                self.format,
            ),
            false,
        ))
    }

    async fn resolve_blocks(&self, path: &str) -> Result<Vec<FileBlock>> {
        let locations = self.storage.block_locations(path).await?;
        Ok(locations
            .into_iter()
            .map(|loc| FileBlock {
                offset: loc.offset,
                length: loc.length,
                host_ids: loc
                    .hosts
                    .iter()
                    .map(|host| self.host_index.intern(host))
                    .collect(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_core::host_index::NetworkAddress;
    use strata_core::storage::MemoryStorage;

    fn stat(rel: &str, size: u64, mtime: i64) -> RawFileStat {
        RawFileStat {
            absolute_path: format!("mem://w/t/{rel}"),
            relative_path: rel.to_string(),
            size,
            modification_time: mtime,
        }
    }

    fn engine(storage: Arc<MemoryStorage>, stats: Arc<LoadStats>, preload: bool) -> DiffEngine {
        let config = LoadConfig {
            preload_block_locations: preload,
            ..LoadConfig::default()
        };
        DiffEngine::new(storage, Arc::new(HostIndex::new()), stats, config, None)
    }

    #[tokio::test]
    async fn matching_descriptor_is_reused_without_block_resolution() {
        let storage = Arc::new(MemoryStorage::new());
        let stats = Arc::new(LoadStats::new());
        let engine = engine(storage, stats.clone(), true);

        // No file in storage: block resolution would fail, proving reuse
        // never touches storage.
        let old = FileDescriptor::new("a.txt", "mem://w/t/a.txt", 10, 5, vec![], None);
        let (fd, skipped) = engine.reconcile(Some(&old), &stat("a.txt", 10, 5)).await.unwrap();

        assert!(skipped);
        assert_eq!(fd, old);
        assert_eq!(stats.skipped_files(), 1);
        assert_eq!(stats.loaded_files(), 0);
    }

    #[tokio::test]
    async fn mtime_change_forces_reload() {
        let storage = Arc::new(MemoryStorage::new());
        storage.create_file("mem://w/t/a.txt", 10, 6).unwrap();
        let stats = Arc::new(LoadStats::new());
        let engine = engine(storage, stats.clone(), true);

        let old = FileDescriptor::new("a.txt", "mem://w/t/a.txt", 10, 5, vec![], None);
        let (fd, skipped) = engine.reconcile(Some(&old), &stat("a.txt", 10, 6)).await.unwrap();

        assert!(!skipped);
        assert_eq!(fd.modification_time(), 6);
        assert_eq!(stats.loaded_files(), 1);
    }

    #[tokio::test]
    async fn new_file_resolves_blocks_through_host_index() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .create_file_on_hosts(
                "mem://w/t/a.txt",
                10,
                5,
                vec![NetworkAddress::new("dn1", 9866), NetworkAddress::new("dn2", 9866)],
            )
            .unwrap();
        let stats = Arc::new(LoadStats::new());
        let host_index = Arc::new(HostIndex::new());
        let engine = DiffEngine::new(storage, host_index.clone(), stats, LoadConfig::default(), None);

        let (fd, _) = engine.reconcile(None, &stat("a.txt", 10, 5)).await.unwrap();
        assert_eq!(fd.num_blocks(), 1);
        assert_eq!(fd.blocks()[0].host_ids, vec![0, 1]);
        assert_eq!(host_index.len(), 2);
    }

    #[tokio::test]
    async fn preloading_disabled_attaches_empty_placement() {
        let storage = Arc::new(MemoryStorage::new());
        storage
            .create_file_on_hosts("mem://w/t/a.txt", 10, 5, vec![NetworkAddress::new("dn1", 9866)])
            .unwrap();
        let stats = Arc::new(LoadStats::new());
        let engine = engine(storage, stats, false);

        let (fd, _) = engine.reconcile(None, &stat("a.txt", 10, 5)).await.unwrap();
        assert_eq!(fd.num_blocks(), 0);
    }
}
