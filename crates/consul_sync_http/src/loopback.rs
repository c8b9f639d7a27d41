//! In-process HTTP for tests.
//!
//! [`LoopbackClient`] hands requests straight to a [`LoopbackServer`]
//! instead of the network. [`KvEmulator`] is a server answering the subset
//! of the Consul KV API that [`crate::ConsulBackend`] uses, on top of a
//! [`MemoryBackend`].

use crate::client::{HttpClient, HttpRequest, HttpResponse, Method};
use consul_sync_core::{BackendError, KvBackend, MemoryBackend};
use parking_lot::Mutex;
use percent_encoding::percent_decode_str;
use std::sync::Arc;

/// Trait for servers that can handle loopback requests.
pub trait LoopbackServer {
    /// Handles a request and returns the response.
    fn handle(&self, request: &HttpRequest) -> HttpResponse;
}

/// A loopback HTTP client that routes requests directly to a server.
///
/// Useful for testing without actual network overhead.
#[derive(Debug)]
pub struct LoopbackClient<S: LoopbackServer> {
    server: S,
}

impl<S: LoopbackServer + Send + Sync> LoopbackClient<S> {
    /// Creates a new loopback client connected to the given server.
    pub fn new(server: S) -> Self {
        Self { server }
    }

    /// The server requests are routed to.
    pub fn server(&self) -> &S {
        &self.server
    }
}

impl<S: LoopbackServer + Send + Sync> HttpClient for LoopbackClient<S> {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, String> {
        Ok(self.server.handle(&request))
    }
}

impl<S: LoopbackServer> LoopbackServer for Arc<S> {
    fn handle(&self, request: &HttpRequest) -> HttpResponse {
        (**self).handle(request)
    }
}

/// Consul KV emulation over a [`MemoryBackend`].
///
/// Failures injected into the store surface as HTTP 500 responses.
#[derive(Debug)]
pub struct KvEmulator {
    store: Arc<MemoryBackend>,
    token: Option<String>,
    log: Mutex<Vec<String>>,
}

impl KvEmulator {
    /// Serves `store` without access control.
    pub fn new(store: Arc<MemoryBackend>) -> Self {
        Self {
            store,
            token: None,
            log: Mutex::new(Vec::new()),
        }
    }

    /// Answers 403 to requests that do not carry `token`.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// The backing store.
    pub fn store(&self) -> &Arc<MemoryBackend> {
        &self.store
    }

    /// Requests seen so far, as `METHOD path?query`.
    pub fn requests(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    fn key_of(request: &HttpRequest) -> Option<String> {
        let mut segments = request.url.path_segments()?;
        // Skip anything before /v1/kv so prefixed base URLs work.
        loop {
            if segments.next()? == "v1" {
                break;
            }
        }
        if segments.next()? != "kv" {
            return None;
        }
        let decoded: Vec<String> = segments
            .map(|s| percent_decode_str(s).decode_utf8_lossy().into_owned())
            .collect();
        Some(decoded.join("/"))
    }

    fn respond(&self, request: &HttpRequest) -> HttpResponse {
        if let Some(expected) = &self.token {
            if request.token.as_ref() != Some(expected) {
                return HttpResponse::new(403, "Permission denied");
            }
        }

        let Some(key) = Self::key_of(request) else {
            return HttpResponse::new(404, "");
        };
        let query = request.url.query().unwrap_or_default();

        match request.method {
            Method::Get if query == "keys" => match self.store.list_keys() {
                Ok(keys) => {
                    let keys: Vec<String> =
                        keys.into_iter().filter(|k| k.starts_with(&key)).collect();
                    if keys.is_empty() {
                        return HttpResponse::new(404, "");
                    }
                    match serde_json::to_vec(&keys) {
                        Ok(body) => HttpResponse::new(200, body),
                        Err(e) => HttpResponse::new(500, e.to_string()),
                    }
                }
                Err(e) => server_error(&e),
            },
            Method::Get => match self.store.get(&key) {
                Ok(Some(value)) => HttpResponse::new(200, value),
                Ok(None) => HttpResponse::new(404, ""),
                Err(e) => server_error(&e),
            },
            Method::Put => match self.store.put(&key, &request.body) {
                Ok(()) => HttpResponse::new(200, "true"),
                Err(BackendError::Rejected { .. }) => HttpResponse::new(200, "false"),
                Err(e) => server_error(&e),
            },
        }
    }
}

impl LoopbackServer for KvEmulator {
    fn handle(&self, request: &HttpRequest) -> HttpResponse {
        let method = match request.method {
            Method::Get => "GET",
            Method::Put => "PUT",
        };
        let mut line = format!("{method} {}", request.url.path());
        if let Some(query) = request.url.query() {
            line.push('?');
            line.push_str(query);
        }
        self.log.lock().push(line);

        self.respond(request)
    }
}

fn server_error(err: &BackendError) -> HttpResponse {
    HttpResponse::new(500, err.to_string())
}
