//! Snapshot-driven file metadata loader for Iceberg tables.
//!
//! Unlike the directory loader, no filesystem walk occurs here: the
//! manifest reader has already resolved exactly which content files are
//! live, grouped by role and annotated with partition and sequence
//! metadata. The loader reconciles that list against prior descriptors
//! through the shared [`DiffEngine`], so files removed from the manifest
//! (by compaction or deletion) disappear from the output even though
//! their removal from storage is never directly observed.
//!
//! Content type, partition id, and sequence number are not part of the
//! reuse-equality test but are re-attached from the manifest on every
//! load, since manifests can reassign them even when the file itself is
//! unchanged. The partition set is recomputed in full each load.

use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, Instrument};

use strata_core::config::LoadConfig;
use strata_core::descriptor::{
    IcebergContentType, IcebergFileDescriptor, IcebergPartition, IcebergPartitionSet,
};
use strata_core::error::{Error, Result};
use strata_core::host_index::HostIndex;
use strata_core::observability::load_span;
use strata_core::paths;
use strata_core::stats::{LoadStats, LoadStatsSnapshot};
use strata_core::storage::StorageClient;

use crate::diff::{DiffEngine, RawFileStat};

/// One live content file as resolved by the manifest reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentFile {
    /// Fully qualified path of the file.
    pub file_path: String,
    /// Size in bytes, from the manifest.
    pub file_size: u64,
    /// Storage-supplied modification timestamp of the file.
    pub modification_time: i64,
    /// Partition the file belongs to.
    pub partition_id: u32,
    /// Data sequence number of the file's commit.
    pub sequence_number: i64,
}

/// The manifest reader's output: live content files grouped by role.
#[derive(Debug, Clone, Default)]
pub struct GroupedContentFiles {
    /// Data files no delete file applies to.
    pub data_files_without_deletes: Vec<ContentFile>,
    /// Data files at least one delete file applies to.
    pub data_files_with_deletes: Vec<ContentFile>,
    /// Position delete files.
    pub position_delete_files: Vec<ContentFile>,
    /// Equality delete files.
    pub equality_delete_files: Vec<ContentFile>,
}

impl GroupedContentFiles {
    /// Total number of content files across all groups.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data_files_without_deletes.len()
            + self.data_files_with_deletes.len()
            + self.position_delete_files.len()
            + self.equality_delete_files.len()
    }

    /// Returns true when the snapshot contains no content files.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates every content file with its content type attached.
    pub fn iter_typed(&self) -> impl Iterator<Item = (&ContentFile, IcebergContentType)> {
        self.data_files_without_deletes
            .iter()
            .chain(self.data_files_with_deletes.iter())
            .map(|f| (f, IcebergContentType::Data))
            .chain(
                self.position_delete_files
                    .iter()
                    .map(|f| (f, IcebergContentType::PositionDelete)),
            )
            .chain(
                self.equality_delete_files
                    .iter()
                    .map(|f| (f, IcebergContentType::EqualityDelete)),
            )
    }
}

/// Output of one snapshot load.
#[derive(Debug, Clone, Default)]
pub struct IcebergLoadResult {
    /// The new descriptor collection, order unspecified.
    pub descriptors: Vec<IcebergFileDescriptor>,
    /// The table's current partition set, rebuilt from the manifest.
    pub partitions: IcebergPartitionSet,
    /// Counters for this load.
    pub stats: LoadStatsSnapshot,
}

/// Loads file metadata for a snapshot-resolved (Iceberg) table.
pub struct IcebergFileMetadataLoader {
    storage: Arc<dyn StorageClient>,
    host_index: Arc<HostIndex>,
    config: LoadConfig,
    table_location: String,
    content: GroupedContentFiles,
    partitions: Vec<IcebergPartition>,
    old_descriptors: HashMap<String, IcebergFileDescriptor>,
    old_partitions: Option<IcebergPartitionSet>,
}

impl IcebergFileMetadataLoader {
    /// Creates a loader for the table rooted at `table_location`, fed by
    /// the manifest reader's `content` and `partitions`.
    ///
    /// `old_descriptors` and `old_partitions` come from the prior load
    /// (empty/`None` on first load) and are never mutated.
    #[must_use]
    pub fn new(
        storage: Arc<dyn StorageClient>,
        host_index: Arc<HostIndex>,
        config: LoadConfig,
        table_location: impl Into<String>,
        content: GroupedContentFiles,
        partitions: Vec<IcebergPartition>,
        old_descriptors: &[IcebergFileDescriptor],
        old_partitions: Option<IcebergPartitionSet>,
    ) -> Self {
        Self {
            storage,
            host_index,
            config,
            table_location: table_location.into(),
            content,
            partitions,
            old_descriptors: old_descriptors
                .iter()
                .map(|fd| (fd.file().relative_path().to_string(), fd.clone()))
                .collect(),
            old_partitions,
        }
    }

    /// Runs the load.
    ///
    /// # Errors
    ///
    /// Returns [`Error::LocationViolation`] when location containment is
    /// required and a content file resolves outside the table root.
    /// Propagates storage failures from block-location resolution.
    pub async fn load(&self) -> Result<IcebergLoadResult> {
        let span = load_span("iceberg_load", &self.table_location);
        async {
            let stats = Arc::new(LoadStats::new());
            let engine = DiffEngine::new(
                Arc::clone(&self.storage),
                Arc::clone(&self.host_index),
                Arc::clone(&stats),
                self.config.clone(),
                None,
            );
            let engine = &engine;

            let descriptors: Vec<IcebergFileDescriptor> = stream::iter(
                self.content
                    .iter_typed()
                    .map(|(file, content)| async move {
                        self.reconcile_content_file(engine, file, content).await
                    }),
            )
            .buffer_unordered(self.config.resolve_concurrency.max(1))
            .try_collect()
            .await?;

            let partitions =
                IcebergPartitionSet::next(self.old_partitions.as_ref(), self.partitions.clone());

            let stats = stats.snapshot();
            debug!(
                loaded = stats.loaded_files,
                skipped = stats.skipped_files,
                partitions = partitions.len(),
                "iceberg file metadata load complete"
            );
            Ok(IcebergLoadResult {
                descriptors,
                partitions,
                stats,
            })
        }
        .instrument(span)
        .await
    }

    async fn reconcile_content_file(
        &self,
        engine: &DiffEngine,
        file: &ContentFile,
        content: IcebergContentType,
    ) -> Result<IcebergFileDescriptor> {
        let relative_path = self.relative_path_of(&file.file_path)?;
        let observed = RawFileStat {
            absolute_path: file.file_path.clone(),
            relative_path,
            size: file.file_size,
            modification_time: file.modification_time,
        };
        let old = self
            .old_descriptors
            .get(&observed.relative_path)
            .map(IcebergFileDescriptor::file);
        let (fd, _) = engine.reconcile(old, &observed).await?;

        // Manifest-supplied fields are refreshed even on reuse; a reused
        // descriptor is a new record copying the invariant file fields.
        Ok(IcebergFileDescriptor::new(
            fd,
            content,
            file.partition_id,
            file.sequence_number,
        ))
    }

    /// Resolves a content file's relative path, enforcing the containment
    /// policy.
    ///
    /// With containment required, the path must sit under the table root.
    /// Without it, files outside the root are keyed by authority plus path
    /// portion of their own storage location, so equal paths on different
    /// filesystems never share a key.
    fn relative_path_of(&self, file_path: &str) -> Result<String> {
        if let Some(relative) = paths::relativize(&self.table_location, file_path) {
            return Ok(relative.to_string());
        }
        if self.config.data_files_in_table_location_only {
            return Err(Error::LocationViolation {
                path: file_path.to_string(),
                table_root: self.table_location.clone(),
            });
        }
        let path = paths::path_of(file_path).trim_start_matches('/');
        Ok(match paths::authority_of(file_path) {
            Some(authority) => format!("{authority}/{path}"),
            None => path.to_string(),
        })
    }
}
