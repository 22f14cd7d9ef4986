//! File descriptor model for catalog file metadata.
//!
//! A [`FileDescriptor`] is the immutable record of one physical data file:
//! its path relative to the table (or partition) root, size, modification
//! time, and optionally its block placement expressed through
//! [`HostIndex`](crate::host_index::HostIndex) ids.
//!
//! Two descriptors with equal relative path, size, and modification time
//! are interchangeable: the diff engine reuses the old one without
//! re-resolving block locations. Modification times are logical clocks
//! supplied by storage, never wall time read locally.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// On-disk file format hint attached to descriptors.
///
/// The loader does not read file contents; the hint only selects
/// format-specific listing behavior (e.g. Hudi version deduplication).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    /// Apache Parquet.
    Parquet,
    /// Apache ORC.
    Orc,
    /// Delimited text.
    Text,
    /// Parquet written by Apache Hudi (multiple physical versions per
    /// logical record, deduplicated at load time).
    HudiParquet,
}

/// One block of a file and the hosts storing a replica of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileBlock {
    /// Byte offset of the block within the file.
    pub offset: u64,
    /// Length of the block in bytes.
    pub length: u64,
    /// Ids of replica hosts, interned through the session's `HostIndex`.
    pub host_ids: Vec<u32>,
}

/// Immutable metadata record for one physical file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDescriptor {
    relative_path: String,
    absolute_path: String,
    size: u64,
    modification_time: i64,
    blocks: Vec<FileBlock>,
    format: Option<FileFormat>,
}

impl FileDescriptor {
    /// Creates a new descriptor.
    #[must_use]
    pub fn new(
        relative_path: impl Into<String>,
        absolute_path: impl Into<String>,
        size: u64,
        modification_time: i64,
        blocks: Vec<FileBlock>,
        format: Option<FileFormat>,
    ) -> Self {
        Self {
            relative_path: relative_path.into(),
            absolute_path: absolute_path.into(),
            size,
            modification_time,
            blocks,
            format,
        }
    }

    /// Path relative to the table or partition root. Descriptor identity.
    #[must_use]
    pub fn relative_path(&self) -> &str {
        &self.relative_path
    }

    /// Fully qualified path of the file.
    #[must_use]
    pub fn absolute_path(&self) -> &str {
        &self.absolute_path
    }

    /// File size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Storage-supplied modification timestamp (logical clock).
    #[must_use]
    pub fn modification_time(&self) -> i64 {
        self.modification_time
    }

    /// Block placement, empty when preloading was disabled.
    #[must_use]
    pub fn blocks(&self) -> &[FileBlock] {
        &self.blocks
    }

    /// Number of blocks with resolved placement.
    #[must_use]
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// File format hint, if the table declared one.
    #[must_use]
    pub fn format(&self) -> Option<FileFormat> {
        self.format
    }

    /// Returns true when `size` and `modification_time` match the observed
    /// values, meaning the file is provably unchanged since this descriptor
    /// was built.
    #[must_use]
    pub fn is_unchanged(&self, size: u64, modification_time: i64) -> bool {
        self.size == size && self.modification_time == modification_time
    }
}

/// Content role of an Iceberg file within a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IcebergContentType {
    /// Row data.
    Data,
    /// Position delete file.
    PositionDelete,
    /// Equality delete file.
    EqualityDelete,
}

/// Descriptor specialization for snapshot-loaded (Iceberg) tables.
///
/// Identity for diffing is still the relative path, but content type,
/// partition id, and sequence number come from the manifest and are
/// re-attached on every load, including loads that reuse the underlying
/// file metadata unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcebergFileDescriptor {
    file: FileDescriptor,
    content: IcebergContentType,
    partition_id: u32,
    sequence_number: i64,
}

impl IcebergFileDescriptor {
    /// Creates a new Iceberg descriptor around base file metadata.
    #[must_use]
    pub fn new(
        file: FileDescriptor,
        content: IcebergContentType,
        partition_id: u32,
        sequence_number: i64,
    ) -> Self {
        Self {
            file,
            content,
            partition_id,
            sequence_number,
        }
    }

    /// The underlying file metadata.
    #[must_use]
    pub fn file(&self) -> &FileDescriptor {
        &self.file
    }

    /// Content role from the manifest.
    #[must_use]
    pub fn content(&self) -> IcebergContentType {
        self.content
    }

    /// Partition id from the manifest.
    #[must_use]
    pub fn partition_id(&self) -> u32 {
        self.partition_id
    }

    /// Data sequence number from the manifest.
    #[must_use]
    pub fn sequence_number(&self) -> i64 {
        self.sequence_number
    }
}

/// One partition of a snapshot-loaded table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IcebergPartition {
    /// Dense partition id referenced by descriptors.
    pub id: u32,
    /// Human-readable partition key values, in spec field order.
    pub values: Vec<String>,
}

/// The full partition set of a snapshot-loaded table.
///
/// Recomputed in full on every load; the version counter advances only
/// when the partition contents actually changed, so a refresh can detect
/// appearing or disappearing partitions independent of file-level churn.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IcebergPartitionSet {
    version: u64,
    partitions: BTreeMap<u32, Vec<String>>,
}

impl IcebergPartitionSet {
    /// Builds the next partition set from manifest-supplied partitions,
    /// advancing the version only if contents differ from `prior`.
    #[must_use]
    pub fn next(prior: Option<&Self>, partitions: Vec<IcebergPartition>) -> Self {
        let partitions: BTreeMap<u32, Vec<String>> =
            partitions.into_iter().map(|p| (p.id, p.values)).collect();
        match prior {
            Some(old) if old.partitions == partitions => Self {
                version: old.version,
                partitions,
            },
            Some(old) => Self {
                version: old.version + 1,
                partitions,
            },
            None => Self {
                version: 0,
                partitions,
            },
        }
    }

    /// Version counter, advanced on content change.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Partition key values by partition id.
    #[must_use]
    pub fn partitions(&self) -> &BTreeMap<u32, Vec<String>> {
        &self.partitions
    }

    /// Number of partitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.partitions.len()
    }

    /// Returns true when the table has no partitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.partitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unchanged_requires_both_size_and_mtime() {
        let fd = FileDescriptor::new("a.parquet", "mem://x/t/a.parquet", 100, 5, vec![], None);
        assert!(fd.is_unchanged(100, 5));
        assert!(!fd.is_unchanged(100, 6));
        assert!(!fd.is_unchanged(99, 5));
    }

    #[test]
    fn partition_set_version_advances_only_on_change() {
        let p = |id: u32, v: &str| IcebergPartition {
            id,
            values: vec![v.to_string()],
        };

        let first = IcebergPartitionSet::next(None, vec![p(0, "2020-01-01")]);
        assert_eq!(first.version(), 0);

        let same = IcebergPartitionSet::next(Some(&first), vec![p(0, "2020-01-01")]);
        assert_eq!(same.version(), 0);

        let grown = IcebergPartitionSet::next(Some(&same), vec![p(0, "2020-01-01"), p(1, "2020-01-02")]);
        assert_eq!(grown.version(), 1);
        assert_eq!(grown.len(), 2);
    }
}
