//! Host endpoint interning shared across loads.
//!
//! Block placement lists refer to the same small set of storage hosts over
//! and over; storing a dense integer id per host instead of repeated
//! host/port strings keeps descriptor collections compact. One `HostIndex`
//! is shared (via `Arc`) by every loader in a catalog session so ids stay
//! consistent across tables.
//!
//! The index is append-only: ids are assigned densely from zero, are stable
//! for the lifetime of the index, and are never reused. Removal is not
//! supported.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::RwLock;

/// A network endpoint (host plus port) referenced by block placement.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NetworkAddress {
    /// Hostname or IP address.
    pub host: String,
    /// Port number.
    pub port: u16,
}

impl NetworkAddress {
    /// Creates a new network address.
    #[must_use]
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Default)]
struct Inner {
    hosts: Vec<NetworkAddress>,
    ids: HashMap<NetworkAddress, u32>,
}

/// Append-only interner mapping a [`NetworkAddress`] to a dense `u32` id.
///
/// Lookups of already-assigned ids take a shared read lock and never block
/// each other; only the assignment of a new id is exclusive.
#[derive(Debug, Default)]
pub struct HostIndex {
    inner: RwLock<Inner>,
}

impl HostIndex {
    /// Creates a new empty host index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id for `addr`, assigning the next dense id on first sight.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned, which only happens if
    /// another thread panicked while holding it.
    pub fn intern(&self, addr: &NetworkAddress) -> u32 {
        {
            let inner = self.inner.read().expect("host index lock poisoned");
            if let Some(&id) = inner.ids.get(addr) {
                return id;
            }
        }
        let mut inner = self.inner.write().expect("host index lock poisoned");
        // Re-check under the write lock: another thread may have interned
        // the same address between our read and write acquisitions.
        if let Some(&id) = inner.ids.get(addr) {
            return id;
        }
        let id = u32::try_from(inner.hosts.len()).expect("host index overflow");
        inner.hosts.push(addr.clone());
        inner.ids.insert(addr.clone(), id);
        id
    }

    /// Returns the address assigned to `id`, if one exists.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<NetworkAddress> {
        let inner = self.inner.read().expect("host index lock poisoned");
        inner.hosts.get(id as usize).cloned()
    }

    /// Returns the number of interned addresses.
    ///
    /// # Panics
    ///
    /// Panics if the internal lock is poisoned.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().expect("host index lock poisoned").hosts.len()
    }

    /// Returns true if no addresses have been interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
