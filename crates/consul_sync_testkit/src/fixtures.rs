//! Test fixtures.
//!
//! [`TestEnv`] owns a temporary snapshot directory and a pair of
//! [`MemoryBackend`] stores. The same stores can be driven directly
//! ([`TestEnv::memory_orchestrator`]) or through the Consul HTTP mapping
//! ([`TestEnv::http_orchestrator`]), so assertions on the stores hold for
//! both.

use consul_sync_core::{
    Connector, Endpoint, MemoryBackend, MemoryConnector, Record, StoreRole, SyncConfig,
    SyncError, SyncOrchestrator, SyncResult,
};
use consul_sync_http::{ConsulBackend, KvEmulator, LoopbackClient};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use time::macros::datetime;
use time::OffsetDateTime;

/// Address the emulated local agent answers on.
pub const LOCAL_ADDR: &str = "http://local.consul.test:8500";
/// Address the emulated staging agent answers on.
pub const STAGING_ADDR: &str = "http://staging.consul.test:8500";
/// ACL token the emulated local agent requires.
pub const LOCAL_TOKEN: &str = "local-token";
/// ACL token the emulated staging agent requires.
pub const STAGING_TOKEN: &str = "staging-token";

/// A fixed instant for deterministic backup file names.
pub const FIXED_TIME: OffsetDateTime = datetime!(2024-03-09 14:05:07 UTC);

/// Stores, snapshot directory and configuration for one test.
pub struct TestEnv {
    /// The local store.
    pub local: Arc<MemoryBackend>,
    /// The staging store.
    pub staging: Arc<MemoryBackend>,
    temp_dir: TempDir,
}

impl TestEnv {
    /// Creates an environment with empty stores.
    pub fn new() -> Self {
        Self::with_stores(MemoryBackend::new(), MemoryBackend::new())
    }

    /// Creates an environment over the given stores.
    pub fn with_stores(local: MemoryBackend, staging: MemoryBackend) -> Self {
        Self {
            local: Arc::new(local),
            staging: Arc::new(staging),
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// The snapshot directory.
    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Configuration pointing at the emulated agents and the snapshot
    /// directory.
    pub fn config(&self) -> SyncConfig {
        SyncConfig::new(
            Endpoint::new(LOCAL_ADDR).with_token(LOCAL_TOKEN),
            Endpoint::new(STAGING_ADDR).with_token(STAGING_TOKEN),
        )
        .with_snapshot_dir(self.dir())
    }

    /// An orchestrator using the stores directly.
    pub fn memory_orchestrator(&self) -> SyncOrchestrator<MemoryConnector> {
        SyncOrchestrator::new(self.config(), self.memory_connector())
    }

    /// A connector over the stores, for tests that need to tweak it.
    pub fn memory_connector(&self) -> MemoryConnector {
        MemoryConnector::new(Arc::clone(&self.local), Arc::clone(&self.staging))
    }

    /// An orchestrator reaching the stores through [`ConsulBackend`] and
    /// [`KvEmulator`].
    pub fn http_orchestrator(&self) -> SyncOrchestrator<EmulatedConnector> {
        SyncOrchestrator::new(self.config(), self.emulated_connector())
    }

    /// The connector used by [`Self::http_orchestrator`].
    pub fn emulated_connector(&self) -> EmulatedConnector {
        EmulatedConnector::new(
            KvEmulator::new(Arc::clone(&self.local)).with_token(LOCAL_TOKEN),
            KvEmulator::new(Arc::clone(&self.staging)).with_token(STAGING_TOKEN),
        )
    }

    /// Path of the export file.
    pub fn export_path(&self) -> PathBuf {
        self.dir().join(consul_sync_core::EXPORT_FILE_NAME)
    }

    /// Writes `records` as the export file.
    pub fn write_export(&self, records: &[Record]) {
        let json = serde_json::to_vec_pretty(records).expect("Failed to encode records");
        std::fs::write(self.export_path(), json).expect("Failed to write export");
    }

    /// Reads and parses a snapshot file.
    pub fn read_snapshot(&self, path: &Path) -> Vec<Record> {
        let bytes = std::fs::read(path).expect("Failed to read snapshot");
        serde_json::from_slice(&bytes).expect("Failed to parse snapshot")
    }

    /// File names in the snapshot directory, sorted.
    pub fn files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(self.dir())
            .expect("Failed to list snapshot directory")
            .map(|entry| {
                entry
                    .expect("Failed to read directory entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }

    /// Backup file names in the snapshot directory, sorted.
    pub fn backups(&self) -> Vec<String> {
        self.files()
            .into_iter()
            .filter(|name| name.starts_with("local_backup_"))
            .collect()
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Backend type produced by [`EmulatedConnector`].
pub type EmulatedBackend = ConsulBackend<LoopbackClient<Arc<KvEmulator>>>;

/// A [`Connector`] serving each role from its own [`KvEmulator`].
///
/// Endpoint addresses and tokens are honoured, so a misconfigured
/// [`Endpoint`] fails the same way it would against a real agent.
#[derive(Debug, Clone)]
pub struct EmulatedConnector {
    local: Arc<KvEmulator>,
    staging: Arc<KvEmulator>,
}

impl EmulatedConnector {
    /// Creates a connector over the given emulators.
    pub fn new(local: KvEmulator, staging: KvEmulator) -> Self {
        Self {
            local: Arc::new(local),
            staging: Arc::new(staging),
        }
    }

    /// The emulator serving `role`.
    pub fn emulator(&self, role: StoreRole) -> &Arc<KvEmulator> {
        match role {
            StoreRole::Local => &self.local,
            StoreRole::Staging => &self.staging,
        }
    }
}

impl Connector for EmulatedConnector {
    type Backend = EmulatedBackend;

    fn connect(&self, role: StoreRole, endpoint: &Endpoint) -> SyncResult<Self::Backend> {
        let client = LoopbackClient::new(Arc::clone(self.emulator(role)));
        ConsulBackend::new(&endpoint.address, endpoint.token.clone(), client)
            .map_err(|e| SyncError::connect(role, e))
    }
}

/// Sorted `(key, value)` pairs of a store, values decoded lossily.
pub fn dump(store: &MemoryBackend) -> Vec<(String, String)> {
    store
        .entries()
        .into_iter()
        .map(|(k, v)| (k, String::from_utf8_lossy(&v).into_owned()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use consul_sync_core::KvBackend;

    #[test]
    fn emulated_connector_uses_tokens() {
        let env = TestEnv::with_stores(
            MemoryBackend::with_entries([("k", "v")]),
            MemoryBackend::new(),
        );
        let connector = env.emulated_connector();

        let backend = connector
            .connect(StoreRole::Local, &env.config().local)
            .unwrap();
        assert_eq!(backend.get("k").unwrap(), Some(b"v".to_vec()));

        let anonymous = connector
            .connect(StoreRole::Local, &Endpoint::new(LOCAL_ADDR))
            .unwrap();
        assert!(anonymous.get("k").is_err());
    }

    #[test]
    fn files_start_empty() {
        let env = TestEnv::new();
        assert!(env.files().is_empty());
        assert!(!env.export_path().exists());
    }

    #[test]
    fn written_export_round_trips() {
        let env = TestEnv::new();
        env.write_export(&[Record::new("a", "1")]);
        assert_eq!(env.read_snapshot(&env.export_path()), vec![Record::new("a", "1")]);
    }
}
