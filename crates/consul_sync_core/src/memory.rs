//! In-memory key-value backend for testing.

use crate::backend::{Connector, KvBackend, StoreRole};
use crate::config::Endpoint;
use crate::error::{BackendError, BackendResult, SyncError, SyncResult};
use parking_lot::RwLock;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Default)]
struct Faults {
    list: Option<String>,
    get: HashSet<String>,
    put: HashSet<String>,
}

/// An in-memory key-value store.
///
/// Keys are listed in sorted order, like Consul does. Individual operations
/// can be made to fail, which lets tests exercise the per-record error paths
/// of the orchestrator.
///
/// # Example
///
/// ```rust
/// use consul_sync_core::{KvBackend, MemoryBackend};
///
/// let store = MemoryBackend::new();
/// store.put("a/b", b"1").unwrap();
/// assert_eq!(store.get("a/b").unwrap(), Some(b"1".to_vec()));
/// assert_eq!(store.list_keys().unwrap(), vec!["a/b".to_string()]);
/// ```
#[derive(Debug, Default)]
pub struct MemoryBackend {
    data: RwLock<BTreeMap<String, Vec<u8>>>,
    faults: RwLock<Faults>,
    writes: RwLock<Vec<(String, Vec<u8>)>>,
}

impl MemoryBackend {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding the given pairs.
    #[must_use]
    pub fn with_entries<K, V, I>(entries: I) -> Self
    where
        K: Into<String>,
        V: Into<Vec<u8>>,
        I: IntoIterator<Item = (K, V)>,
    {
        let data = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            data: RwLock::new(data),
            ..Self::default()
        }
    }

    /// Inserts a value without recording it as a write.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Vec<u8>>) {
        self.data.write().insert(key.into(), value.into());
    }

    /// Returns a copy of the stored pairs.
    #[must_use]
    pub fn entries(&self) -> BTreeMap<String, Vec<u8>> {
        self.data.read().clone()
    }

    /// Returns every successful `put`, in call order.
    #[must_use]
    pub fn writes(&self) -> Vec<(String, Vec<u8>)> {
        self.writes.read().clone()
    }

    /// Makes `list_keys` fail.
    pub fn fail_listing(&self, message: impl Into<String>) {
        self.faults.write().list = Some(message.into());
    }

    /// Makes `get` fail for `key`.
    pub fn fail_get(&self, key: impl Into<String>) {
        self.faults.write().get.insert(key.into());
    }

    /// Makes `put` fail for `key`.
    pub fn fail_put(&self, key: impl Into<String>) {
        self.faults.write().put.insert(key.into());
    }

    /// Removes all injected failures.
    pub fn clear_faults(&self) {
        *self.faults.write() = Faults::default();
    }
}

impl KvBackend for MemoryBackend {
    fn list_keys(&self) -> BackendResult<Vec<String>> {
        if let Some(message) = &self.faults.read().list {
            return Err(BackendError::Unavailable(message.clone()));
        }
        Ok(self.data.read().keys().cloned().collect())
    }

    fn get(&self, key: &str) -> BackendResult<Option<Vec<u8>>> {
        if self.faults.read().get.contains(key) {
            return Err(BackendError::Unavailable(format!("get {key}")));
        }
        Ok(self.data.read().get(key).cloned())
    }

    fn put(&self, key: &str, value: &[u8]) -> BackendResult<()> {
        if self.faults.read().put.contains(key) {
            return Err(BackendError::Rejected {
                key: key.to_string(),
            });
        }
        self.data.write().insert(key.to_string(), value.to_vec());
        self.writes.write().push((key.to_string(), value.to_vec()));
        Ok(())
    }
}

/// Connects to a pair of shared [`MemoryBackend`]s, ignoring endpoints.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    local: Arc<MemoryBackend>,
    staging: Arc<MemoryBackend>,
    refuse: Vec<StoreRole>,
}

impl MemoryConnector {
    /// Creates a connector over the given stores.
    pub fn new(local: Arc<MemoryBackend>, staging: Arc<MemoryBackend>) -> Self {
        Self {
            local,
            staging,
            refuse: Vec::new(),
        }
    }

    /// Makes `connect` fail for `role`.
    #[must_use]
    pub fn refusing(mut self, role: StoreRole) -> Self {
        self.refuse.push(role);
        self
    }

    /// The local store.
    pub fn local(&self) -> &Arc<MemoryBackend> {
        &self.local
    }

    /// The staging store.
    pub fn staging(&self) -> &Arc<MemoryBackend> {
        &self.staging
    }
}

impl Connector for MemoryConnector {
    type Backend = Arc<MemoryBackend>;

    fn connect(&self, role: StoreRole, endpoint: &Endpoint) -> SyncResult<Self::Backend> {
        if self.refuse.contains(&role) {
            return Err(SyncError::connect(
                role,
                format!("connection refused by {}", endpoint.address),
            ));
        }
        Ok(match role {
            StoreRole::Local => Arc::clone(&self.local),
            StoreRole::Staging => Arc::clone(&self.staging),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_is_upsert() {
        let store = MemoryBackend::with_entries([("k", "old")]);
        store.put("k", b"new").unwrap();
        assert_eq!(store.get("k").unwrap(), Some(b"new".to_vec()));
        assert_eq!(store.entries().len(), 1);
        assert_eq!(store.writes(), vec![("k".to_string(), b"new".to_vec())]);
    }

    #[test]
    fn missing_key_is_none() {
        let store = MemoryBackend::new();
        assert_eq!(store.get("nope").unwrap(), None);
    }

    #[test]
    fn keys_are_sorted() {
        let store = MemoryBackend::with_entries([("b", "2"), ("a", "1"), ("a/c", "3")]);
        assert_eq!(store.list_keys().unwrap(), vec!["a", "a/c", "b"]);
    }

    #[test]
    fn injected_faults() {
        let store = MemoryBackend::with_entries([("a", "1")]);
        store.fail_get("a");
        store.fail_put("b");
        store.fail_listing("down");

        assert!(matches!(store.get("a"), Err(BackendError::Unavailable(_))));
        assert!(matches!(store.put("b", b"x"), Err(BackendError::Rejected { .. })));
        assert!(store.list_keys().is_err());
        assert!(store.writes().is_empty());

        store.clear_faults();
        assert_eq!(store.get("a").unwrap(), Some(b"1".to_vec()));
        assert!(store.list_keys().is_ok());
    }

    #[test]
    fn connector_routes_by_role() {
        let local = Arc::new(MemoryBackend::with_entries([("l", "1")]));
        let staging = Arc::new(MemoryBackend::with_entries([("s", "2")]));
        let connector = MemoryConnector::new(local, staging);
        let endpoint = Endpoint::new("memory://");

        let backend = connector.connect(StoreRole::Staging, &endpoint).unwrap();
        assert_eq!(backend.list_keys().unwrap(), vec!["s"]);

        let connector = connector.refusing(StoreRole::Local);
        let err = connector.connect(StoreRole::Local, &endpoint).unwrap_err();
        assert!(matches!(err, SyncError::Connect { role: StoreRole::Local, .. }));
    }
}
