//! HTTP client abstraction.
//!
//! The Consul backend talks to the network only through [`HttpClient`], so
//! the wire handling can be exercised without a server (see
//! [`crate::LoopbackClient`]).

use std::time::Duration;
use tracing::debug;
use url::Url;

/// Header carrying the Consul ACL token.
pub const TOKEN_HEADER: &str = "X-Consul-Token";

const USER_AGENT: &str = concat!("consul-sync/", env!("CARGO_PKG_VERSION"));

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// `GET`
    Get,
    /// `PUT`
    Put,
}

/// A request to send.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Method.
    pub method: Method,
    /// Full URL including query.
    pub url: Url,
    /// ACL token sent in [`TOKEN_HEADER`].
    pub token: Option<String>,
    /// Request body; empty for `GET`.
    pub body: Vec<u8>,
}

/// A received response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a response.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// HTTP client abstraction.
///
/// Implementations return `Err` only when no response was received; any
/// status code is a successful exchange at this layer.
pub trait HttpClient: Send + Sync {
    /// Sends `request` and waits for the response.
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, String>;
}

/// Blocking client backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    inner: reqwest::blocking::Client,
}

impl ReqwestClient {
    /// Builds a client whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, String> {
        let inner = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()
            .map_err(|e| format!("failed to build http client: {e}"))?;
        Ok(Self { inner })
    }
}

impl HttpClient for ReqwestClient {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, String> {
        debug!(method = ?request.method, url = %request.url, "consul request");

        let mut builder = match request.method {
            Method::Get => self.inner.get(request.url),
            Method::Put => self.inner.put(request.url).body(request.body),
        };
        if let Some(token) = &request.token {
            builder = builder.header(TOKEN_HEADER, token);
        }

        let response = builder.send().map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(|e| e.to_string())?;
        Ok(HttpResponse::new(status, body.to_vec()))
    }
}
