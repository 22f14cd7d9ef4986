//! # strata-core
//!
//! Core primitives for the Strata table catalog.
//!
//! This crate defines the types shared by every file metadata loader:
//!
//! - **Descriptors**: immutable per-file metadata records
//! - **Host Index**: dense interning of storage endpoints for block placement
//! - **Storage Traits**: the listing/placement contract loaders consume
//! - **Load Stats**: atomic per-load counters
//! - **Config**: block-location preloading and containment switches
//! - **Error Types**: shared error definitions and result types
//!
//! ## Crate Boundary
//!
//! `strata-core` is the only crate allowed to define shared primitives.
//! The loaders in `strata-filemeta` build exclusively on the contracts
//! defined here.

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(rust_2018_idioms)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod descriptor;
pub mod error;
pub mod host_index;
pub mod observability;
pub mod paths;
pub mod stats;
pub mod storage;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust
/// use strata_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::LoadConfig;
    pub use crate::descriptor::{
        FileBlock, FileDescriptor, FileFormat, IcebergContentType, IcebergFileDescriptor,
        IcebergPartition, IcebergPartitionSet,
    };
    pub use crate::error::{Error, Result};
    pub use crate::host_index::{HostIndex, NetworkAddress};
    pub use crate::stats::{LoadStats, LoadStatsSnapshot};
    pub use crate::storage::{BlockLocation, DirEntry, MemoryStorage, StorageClient};
}

// Re-export key types at crate root for ergonomics
pub use config::LoadConfig;
pub use descriptor::{
    FileBlock, FileDescriptor, FileFormat, IcebergContentType, IcebergFileDescriptor,
    IcebergPartition, IcebergPartitionSet,
};
pub use error::{Error, Result};
pub use host_index::{HostIndex, NetworkAddress};
pub use observability::{init_logging, LogFormat};
pub use stats::{LoadStats, LoadStatsSnapshot};
pub use storage::{BlockLocation, DirEntry, MemoryStorage, StorageClient};
