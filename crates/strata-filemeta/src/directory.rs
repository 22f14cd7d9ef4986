//! Directory-walking file metadata loader.
//!
//! Walks a table (or partition) location, recursively or not, skipping
//! hidden entries, and routes every observed file through the
//! [`DiffEngine`] so unchanged files reuse their prior descriptor. ACID
//! write-id filtering and Hudi latest-version selection run as pre-filter
//! stages between listing and diffing.
//!
//! A missing root is not an error: a table whose location was removed
//! out-of-band simply has no files. Result ordering is not guaranteed;
//! callers needing determinism must sort by relative path.

use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn, Instrument};

use strata_core::config::LoadConfig;
use strata_core::descriptor::{FileDescriptor, FileFormat};
use strata_core::error::Result;
use strata_core::host_index::HostIndex;
use strata_core::observability::load_span;
use strata_core::stats::{LoadStats, LoadStatsSnapshot};
use strata_core::storage::StorageClient;
use strata_core::paths;

use crate::acid::{filter_acid_files, ValidWriteIdList};
use crate::diff::{DiffEngine, RawFileStat};
use crate::versioned::select_latest_versions;

/// Returns true for names table-writing engines use for staging or
/// temporary entries, which must never surface in a load.
fn is_hidden(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('_')
}

/// Output of one directory load.
#[derive(Debug, Clone, Default)]
pub struct LoadResult {
    /// The new descriptor collection, order unspecified.
    pub descriptors: Vec<FileDescriptor>,
    /// Counters for this load.
    pub stats: LoadStatsSnapshot,
}

/// Loads the file metadata of one table or partition location.
pub struct FileMetadataLoader {
    storage: Arc<dyn StorageClient>,
    host_index: Arc<HostIndex>,
    config: LoadConfig,
    table_path: String,
    recursive: bool,
    old_descriptors: HashMap<String, FileDescriptor>,
    write_ids: Option<ValidWriteIdList>,
    format: Option<FileFormat>,
}

impl FileMetadataLoader {
    /// Creates a loader for `table_path`.
    ///
    /// `old_descriptors` is the borrowed result of the prior load (empty
    /// on first load); it is indexed by relative path and never mutated.
    #[must_use]
    pub fn new(
        storage: Arc<dyn StorageClient>,
        host_index: Arc<HostIndex>,
        config: LoadConfig,
        table_path: impl Into<String>,
        recursive: bool,
        old_descriptors: &[FileDescriptor],
    ) -> Self {
        Self {
            storage,
            host_index,
            config,
            table_path: table_path.into(),
            recursive,
            old_descriptors: old_descriptors
                .iter()
                .map(|fd| (fd.relative_path().to_string(), fd.clone()))
                .collect(),
            write_ids: None,
            format: None,
        }
    }

    /// Enables transactional filtering against a validity snapshot.
    #[must_use]
    pub fn with_valid_write_ids(mut self, write_ids: ValidWriteIdList) -> Self {
        self.write_ids = Some(write_ids);
        self
    }

    /// Attaches a file format hint. `HudiParquet` additionally enables
    /// latest-version selection.
    #[must_use]
    pub fn with_format(mut self, format: FileFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Runs the load.
    ///
    /// # Errors
    ///
    /// Propagates storage failures other than a missing root, which yields
    /// an empty result instead.
    pub async fn load(&self) -> Result<LoadResult> {
        let span = load_span("load", &self.table_path);
        async {
            let mut raw = self.list_files().await?;

            if self.format == Some(FileFormat::HudiParquet) {
                raw = select_latest_versions(raw);
            }

            let stats = Arc::new(LoadStats::new());
            if let Some(write_ids) = &self.write_ids {
                let outcome = filter_acid_files(raw, write_ids);
                stats.record_superseded(outcome.superseded);
                raw = outcome.files;
            }

            let descriptors = self.reconcile_all(raw, Arc::clone(&stats)).await?;

            let stats = stats.snapshot();
            debug!(
                loaded = stats.loaded_files,
                skipped = stats.skipped_files,
                superseded = stats.files_superseded_by_acid_state,
                "file metadata load complete"
            );
            Ok(LoadResult { descriptors, stats })
        }
        .instrument(span)
        .await
    }

    /// Lists all files under the table root, applying hidden-entry
    /// filtering and (when enabled) recursion.
    async fn list_files(&self) -> Result<Vec<RawFileStat>> {
        let root = self.table_path.trim_end_matches('/').to_string();
        let mut pending = vec![root.clone()];
        let mut out = Vec::new();

        while let Some(dir) = pending.pop() {
            let entries = match self.storage.list_entries(&dir).await {
                Ok(entries) => entries,
                Err(err) if err.is_not_found() && dir == root => {
                    debug!(table = %root, "table location does not exist; loading empty file set");
                    return Ok(Vec::new());
                }
                Err(err) if err.is_not_found() => {
                    // Directory removed between listing its parent and
                    // descending into it.
                    debug!(dir = %dir, "directory vanished during listing");
                    continue;
                }
                Err(err) => return Err(err),
            };

            for entry in entries {
                let name = paths::file_name(&entry.path);
                if is_hidden(name) {
                    continue;
                }
                if entry.is_directory {
                    if self.recursive {
                        pending.push(entry.path);
                    }
                    continue;
                }
                let Some(relative) = paths::relativize(&root, &entry.path) else {
                    warn!(path = %entry.path, "listed file is outside the table root, skipping");
                    continue;
                };
                out.push(RawFileStat {
                    relative_path: relative.to_string(),
                    absolute_path: entry.path,
                    size: entry.size,
                    modification_time: entry.modification_time,
                });
            }
        }
        Ok(out)
    }

    /// Reconciles all observed files, resolving block locations with
    /// bounded concurrency.
    async fn reconcile_all(
        &self,
        raw: Vec<RawFileStat>,
        stats: Arc<LoadStats>,
    ) -> Result<Vec<FileDescriptor>> {
        let engine = DiffEngine::new(
            Arc::clone(&self.storage),
            Arc::clone(&self.host_index),
            stats,
            self.config.clone(),
            self.format,
        );
        let engine = &engine;

        stream::iter(raw.into_iter().map(|observed| async move {
            let old = self.old_descriptors.get(&observed.relative_path);
            let (fd, _) = engine.reconcile(old, &observed).await?;
            Ok(fd)
        }))
        .buffer_unordered(self.config.resolve_concurrency.max(1))
        .try_collect()
        .await
    }
}
