//! Storage client abstraction consumed by the metadata loaders.
//!
//! The loaders never talk to a concrete filesystem; they consume this
//! narrow listing/placement contract. Production backends wrap an HDFS or
//! object-store client and are expected to carry their own timeout and
//! retry policy; calls here are treated as synchronous-per-await and
//! their failures propagate as [`Error::Storage`].
//!
//! Paths are URI-style strings (`scheme://authority/path`). Listing order
//! is arbitrary and may vary between backends and invocations; callers
//! requiring deterministic order must sort.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::error::{Error, Result};
use crate::host_index::NetworkAddress;
use crate::paths;

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// Fully qualified path of the entry.
    pub path: String,
    /// True when the entry is a directory.
    pub is_directory: bool,
    /// Size in bytes; zero for directories.
    pub size: u64,
    /// Storage-supplied modification timestamp (logical clock).
    pub modification_time: i64,
}

/// Placement of one file block across storage hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockLocation {
    /// Byte offset of the block within the file.
    pub offset: u64,
    /// Length of the block in bytes.
    pub length: u64,
    /// Hosts storing a replica of the block.
    pub hosts: Vec<NetworkAddress>,
}

/// Filesystem/object-store client contract.
#[async_trait]
pub trait StorageClient: Send + Sync + 'static {
    /// Lists the immediate entries of a directory.
    ///
    /// Returns [`Error::NotFound`] when `path` does not exist.
    async fn list_entries(&self, path: &str) -> Result<Vec<DirEntry>>;

    /// Resolves block placement for a file.
    ///
    /// Returns [`Error::NotFound`] when `path` does not exist.
    async fn block_locations(&self, path: &str) -> Result<Vec<BlockLocation>>;
}

#[derive(Debug, Clone)]
enum Node {
    Directory,
    File {
        size: u64,
        modification_time: i64,
        blocks: Vec<BlockLocation>,
    },
}

/// In-memory storage client for testing.
///
/// Thread-safe via `RwLock`. Not suitable for production.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    nodes: RwLock<BTreeMap<String, Node>>,
}

impl MemoryStorage {
    /// Creates a new empty storage tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn normalize(path: &str) -> String {
        path.trim_end_matches('/').to_string()
    }

    fn write_lock(&self) -> Result<std::sync::RwLockWriteGuard<'_, BTreeMap<String, Node>>> {
        self.nodes
            .write()
            .map_err(|_| Error::internal("storage lock poisoned"))
    }

    fn read_lock(&self) -> Result<std::sync::RwLockReadGuard<'_, BTreeMap<String, Node>>> {
        self.nodes
            .read()
            .map_err(|_| Error::internal("storage lock poisoned"))
    }

    fn ensure_parents(nodes: &mut BTreeMap<String, Node>, path: &str) {
        let mut current = path.to_string();
        while let Some(parent) = paths::parent(&current) {
            nodes.entry(parent.to_string()).or_insert(Node::Directory);
            current = parent.to_string();
        }
    }

    /// Creates a directory (and its ancestors).
    ///
    /// # Errors
    ///
    /// Returns an internal error if the storage lock is poisoned.
    pub fn mkdir(&self, path: &str) -> Result<()> {
        let path = Self::normalize(path);
        let mut nodes = self.write_lock()?;
        Self::ensure_parents(&mut nodes, &path);
        nodes.insert(path, Node::Directory);
        Ok(())
    }

    /// Creates a file with the given size and modification time and no
    /// block placement. Ancestor directories are created implicitly.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the storage lock is poisoned.
    pub fn create_file(&self, path: &str, size: u64, modification_time: i64) -> Result<()> {
        self.create_file_with_blocks(path, size, modification_time, Vec::new())
    }

    /// Creates a file whose single block is replicated on `hosts`.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the storage lock is poisoned.
    pub fn create_file_on_hosts(
        &self,
        path: &str,
        size: u64,
        modification_time: i64,
        hosts: Vec<NetworkAddress>,
    ) -> Result<()> {
        let blocks = vec![BlockLocation {
            offset: 0,
            length: size,
            hosts,
        }];
        self.create_file_with_blocks(path, size, modification_time, blocks)
    }

    /// Creates a file with explicit block placement.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the storage lock is poisoned.
    pub fn create_file_with_blocks(
        &self,
        path: &str,
        size: u64,
        modification_time: i64,
        blocks: Vec<BlockLocation>,
    ) -> Result<()> {
        let path = Self::normalize(path);
        let mut nodes = self.write_lock()?;
        Self::ensure_parents(&mut nodes, &path);
        nodes.insert(
            path,
            Node::File {
                size,
                modification_time,
                blocks,
            },
        );
        Ok(())
    }

    /// Updates a file's modification time in place.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] when the file does not exist.
    pub fn touch(&self, path: &str, modification_time: i64) -> Result<()> {
        let path = Self::normalize(path);
        let mut nodes = self.write_lock()?;
        match nodes.get_mut(&path) {
            Some(Node::File {
                modification_time: mtime,
                ..
            }) => {
                *mtime = modification_time;
                Ok(())
            }
            _ => Err(Error::NotFound(path)),
        }
    }

    /// Removes a file or directory subtree.
    ///
    /// # Errors
    ///
    /// Returns an internal error if the storage lock is poisoned.
    pub fn remove(&self, path: &str) -> Result<()> {
        let path = Self::normalize(path);
        let prefix = format!("{path}/");
        let mut nodes = self.write_lock()?;
        nodes.retain(|k, _| k != &path && !k.starts_with(&prefix));
        Ok(())
    }
}

#[async_trait]
impl StorageClient for MemoryStorage {
    async fn list_entries(&self, path: &str) -> Result<Vec<DirEntry>> {
        let path = Self::normalize(path);
        let prefix = format!("{path}/");
        let nodes = self.read_lock()?;

        match nodes.get(&path) {
            Some(Node::Directory) => {}
            Some(Node::File { .. }) => {
                return Err(Error::InvalidInput(format!("not a directory: {path}")));
            }
            None => return Err(Error::NotFound(path)),
        }

        Ok(nodes
            .range(prefix.clone()..)
            .take_while(|(k, _)| k.starts_with(&prefix))
            .filter(|(k, _)| !k[prefix.len()..].contains('/'))
            .map(|(k, node)| match node {
                Node::Directory => DirEntry {
                    path: k.clone(),
                    is_directory: true,
                    size: 0,
                    modification_time: 0,
                },
                Node::File {
                    size,
                    modification_time,
                    ..
                } => DirEntry {
                    path: k.clone(),
                    is_directory: false,
                    size: *size,
                    modification_time: *modification_time,
                },
            })
            .collect())
    }

    async fn block_locations(&self, path: &str) -> Result<Vec<BlockLocation>> {
        let path = Self::normalize(path);
        let nodes = self.read_lock()?;
        match nodes.get(&path) {
            Some(Node::File { blocks, .. }) => Ok(blocks.clone()),
            _ => Err(Error::NotFound(path)),
        }
    }
}
