//! Builds Consul backends from configured endpoints.

use crate::client::ReqwestClient;
use crate::consul::ConsulBackend;
use consul_sync_core::{Connector, Endpoint, StoreRole, SyncError, SyncResult};
use std::time::Duration;
use tracing::debug;

/// A [`Connector`] producing reqwest-backed [`ConsulBackend`]s.
#[derive(Debug, Clone)]
pub struct HttpConnector {
    timeout: Duration,
}

impl HttpConnector {
    /// Creates a connector whose clients time out after `timeout`.
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for HttpConnector {
    fn default() -> Self {
        Self::new(consul_sync_core::DEFAULT_REQUEST_TIMEOUT)
    }
}

impl Connector for HttpConnector {
    type Backend = ConsulBackend<ReqwestClient>;

    fn connect(&self, role: StoreRole, endpoint: &Endpoint) -> SyncResult<Self::Backend> {
        debug!(%role, address = %endpoint.address, "creating client");
        let client = ReqwestClient::new(self.timeout).map_err(|e| SyncError::connect(role, e))?;
        ConsulBackend::new(&endpoint.address, endpoint.token.clone(), client)
            .map_err(|e| SyncError::connect(role, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connects_without_network() {
        let connector = HttpConnector::default();
        let endpoint = Endpoint::new("http://localhost:8500").with_token("t");
        let backend = connector.connect(StoreRole::Local, &endpoint).unwrap();
        assert_eq!(backend.base_url().as_str(), "http://localhost:8500/");
    }

    #[test]
    fn invalid_address_is_connect_error() {
        let connector = HttpConnector::new(Duration::from_secs(1));
        let endpoint = Endpoint::new("staging-consul:8500/no-scheme");
        let err = connector.connect(StoreRole::Staging, &endpoint).unwrap_err();
        assert!(matches!(
            err,
            SyncError::Connect {
                role: StoreRole::Staging,
                ..
            }
        ));
    }
}
