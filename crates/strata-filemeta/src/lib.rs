//! # strata-filemeta
//!
//! Incremental file-metadata loading for Strata tables.
//!
//! For each table backed by a distributed filesystem or object store,
//! this crate discovers the physical files that currently constitute the
//! table and converts each into a lightweight descriptor, reusing the
//! descriptor from a prior load whenever the file is provably unchanged.
//! Refresh cost is therefore proportional to the delta of files, not the
//! table size.
//!
//! Three discovery models share one reuse-or-reload contract
//! ([`diff::DiffEngine`]):
//!
//! - [`directory::FileMetadataLoader`] walks a storage location, with
//!   optional transactional ([`acid`]) and latest-version ([`versioned`])
//!   pre-filter stages;
//! - [`iceberg::IcebergFileMetadataLoader`] consumes an externally
//!   resolved snapshot manifest and never walks the filesystem.
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use strata_core::{HostIndex, LoadConfig, MemoryStorage};
//! use strata_filemeta::FileMetadataLoader;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> strata_core::Result<()> {
//! let storage = Arc::new(MemoryStorage::new());
//! storage.create_file("mem://warehouse/t/part-0.parquet", 128, 1)?;
//!
//! let loader = FileMetadataLoader::new(
//!     storage,
//!     Arc::new(HostIndex::new()),
//!     LoadConfig::default(),
//!     "mem://warehouse/t",
//!     /* recursive */ true,
//!     /* old_descriptors */ &[],
//! );
//! let result = loader.load().await?;
//! assert_eq!(result.stats.loaded_files, 1);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod acid;
pub mod diff;
pub mod directory;
pub mod iceberg;
pub mod versioned;

pub use acid::{filter_acid_files, AcidDirectory, AcidFilterOutcome, ValidWriteIdList};
pub use diff::{DiffEngine, RawFileStat};
pub use directory::{FileMetadataLoader, LoadResult};
pub use iceberg::{
    ContentFile, GroupedContentFiles, IcebergFileMetadataLoader, IcebergLoadResult,
};
pub use versioned::select_latest_versions;
