//! Key-value backend trait definition.

use crate::config::Endpoint;
use crate::error::{BackendResult, SyncResult};
use std::fmt;
use std::sync::Arc;

/// Which of the two stores an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreRole {
    /// The store that backups are taken from and imports are written to.
    Local,
    /// The store that exports are taken from.
    Staging,
}

impl fmt::Display for StoreRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreRole::Local => f.write_str("local"),
            StoreRole::Staging => f.write_str("staging"),
        }
    }
}

/// A remote key-value store.
///
/// Values are opaque byte strings. `put` has upsert semantics: writing an
/// existing key replaces its value.
///
/// # Implementors
///
/// - [`super::MemoryBackend`] - For testing
/// - `ConsulBackend` in `consul_sync_http` - Consul KV over HTTP
pub trait KvBackend: Send + Sync {
    /// Lists every key in the store, in the order the store returns them.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be reached or answers
    /// with something other than a key list.
    fn list_keys(&self) -> BackendResult<Vec<String>>;

    /// Fetches the value stored under `key`.
    ///
    /// Returns `Ok(None)` if the key does not exist.
    fn get(&self, key: &str) -> BackendResult<Option<Vec<u8>>>;

    /// Creates or replaces the value under `key`.
    fn put(&self, key: &str, value: &[u8]) -> BackendResult<()>;
}

impl<B: KvBackend + ?Sized> KvBackend for Arc<B> {
    fn list_keys(&self) -> BackendResult<Vec<String>> {
        (**self).list_keys()
    }

    fn get(&self, key: &str) -> BackendResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> BackendResult<()> {
        (**self).put(key, value)
    }
}

impl<B: KvBackend + ?Sized> KvBackend for Box<B> {
    fn list_keys(&self) -> BackendResult<Vec<String>> {
        (**self).list_keys()
    }

    fn get(&self, key: &str) -> BackendResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn put(&self, key: &str, value: &[u8]) -> BackendResult<()> {
        (**self).put(key, value)
    }
}

/// Builds backends from configured endpoints.
///
/// Connecting is the only fatal step of talking to a store: once a backend
/// exists, individual calls fail independently.
pub trait Connector {
    /// Backend type produced by this connector.
    type Backend: KvBackend;

    /// Creates a client for `role` at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::SyncError::Connect`] if the client cannot be built.
    fn connect(&self, role: StoreRole, endpoint: &Endpoint) -> SyncResult<Self::Backend>;
}
