//! Configuration for sync operations.

use crate::backend::StoreRole;
use crate::error::{SyncError, SyncResult};
use std::path::PathBuf;
use std::time::Duration;

/// Default address of the local store.
pub const DEFAULT_LOCAL_ADDR: &str = "http://localhost:8500";
/// Default address of the staging store.
pub const DEFAULT_STAGING_ADDR: &str = "http://staging-consul:8500";
/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Environment variable naming the local store address.
pub const LOCAL_ADDR_VAR: &str = "LOCAL_CONSUL_ADDR";
/// Environment variable holding the local store token.
pub const LOCAL_TOKEN_VAR: &str = "LOCAL_CONSUL_TOKEN";
/// Environment variable naming the staging store address.
pub const STAGING_ADDR_VAR: &str = "STAGING_CONSUL_ADDR";
/// Environment variable holding the staging store token.
pub const STAGING_TOKEN_VAR: &str = "STAGING_CONSUL_TOKEN";

/// Address and credentials of one store.
#[derive(Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Base URL, e.g. `http://localhost:8500`.
    pub address: String,
    /// Access token, if any.
    pub token: Option<String>,
}

impl Endpoint {
    /// Creates an endpoint without a token.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: None,
        }
    }

    /// Sets the access token. An empty token means none.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = (!token.is_empty()).then_some(token);
        self
    }
}

// Tokens stay out of logs.
impl std::fmt::Debug for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Endpoint")
            .field("address", &self.address)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Configuration for a sync run.
///
/// Built once at startup and handed to the orchestrator. Nothing below the
/// CLI reads the process environment.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// The local store.
    pub local: Endpoint,
    /// The staging store.
    pub staging: Endpoint,
    /// Directory that snapshot files are read from and written to.
    pub snapshot_dir: PathBuf,
    /// Per-request timeout for store clients.
    pub request_timeout: Duration,
}

impl SyncConfig {
    /// Creates a configuration with explicit endpoints.
    pub fn new(local: Endpoint, staging: Endpoint) -> Self {
        Self {
            local,
            staging,
            snapshot_dir: PathBuf::from("."),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Reads endpoints from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Reads endpoints through `lookup`. Unset and empty variables fall
    /// back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());

        let local_addr = var(LOCAL_ADDR_VAR).unwrap_or_else(|| DEFAULT_LOCAL_ADDR.into());
        let mut local = Endpoint::new(local_addr);
        if let Some(token) = var(LOCAL_TOKEN_VAR) {
            local = local.with_token(token);
        }

        let staging_addr = var(STAGING_ADDR_VAR).unwrap_or_else(|| DEFAULT_STAGING_ADDR.into());
        let mut staging = Endpoint::new(staging_addr);
        if let Some(token) = var(STAGING_TOKEN_VAR) {
            staging = staging.with_token(token);
        }

        Self::new(local, staging)
    }

    /// Sets the snapshot directory.
    pub fn with_snapshot_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.snapshot_dir = dir.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Returns the endpoint for `role`.
    pub fn endpoint(&self, role: StoreRole) -> &Endpoint {
        match role {
            StoreRole::Local => &self.local,
            StoreRole::Staging => &self.staging,
        }
    }

    /// Checks the settings that would otherwise only fail halfway through a
    /// run.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidConfig`] for a zero timeout or a snapshot
    /// directory that does not exist.
    pub fn validate(&self) -> SyncResult<()> {
        if self.request_timeout.is_zero() {
            return Err(SyncError::InvalidConfig(
                "request timeout must be greater than zero".into(),
            ));
        }
        if !self.snapshot_dir.is_dir() {
            return Err(SyncError::InvalidConfig(format!(
                "snapshot directory {} does not exist",
                self.snapshot_dir.display()
            )));
        }
        Ok(())
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new(
            Endpoint::new(DEFAULT_LOCAL_ADDR),
            Endpoint::new(DEFAULT_STAGING_ADDR),
        )
    }
}
