//! Consul KV backend.
//!
//! Endpoints used:
//! - `GET  /v1/kv/?keys`     list every key (404 when the store is empty)
//! - `GET  /v1/kv/<key>?raw` fetch a raw value (404 when absent)
//! - `PUT  /v1/kv/<key>`     upsert a raw value, answers `true` or `false`

use crate::client::{HttpClient, HttpRequest, HttpResponse, Method};
use consul_sync_core::{BackendError, BackendResult, KvBackend};
use url::Url;

const MAX_ERROR_BODY: usize = 512;

/// A [`KvBackend`] speaking the Consul KV HTTP API.
#[derive(Debug)]
pub struct ConsulBackend<C: HttpClient> {
    base: Url,
    token: Option<String>,
    client: C,
}

impl<C: HttpClient> ConsulBackend<C> {
    /// Creates a backend for the agent at `address`.
    ///
    /// # Errors
    ///
    /// Returns a message if `address` is not an absolute `http(s)` URL.
    pub fn new(address: &str, token: Option<String>, client: C) -> Result<Self, String> {
        let base = Url::parse(address).map_err(|e| format!("invalid address {address:?}: {e}"))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            return Err(format!("invalid address {address:?}: expected http(s) URL"));
        }
        Ok(Self {
            base,
            token: token.filter(|t| !t.is_empty()),
            client,
        })
    }

    /// The agent address.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// The HTTP client in use.
    pub fn client(&self) -> &C {
        &self.client
    }

    /// Returns the URL of `key` under `/v1/kv/`. Each `/`-separated segment
    /// is percent-encoded on its own.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::InvalidKey`] if a segment is `.` or `..`: URL
    /// normalization would fold those into a different key.
    pub fn key_url(&self, key: &str) -> BackendResult<Url> {
        if key.split('/').any(|segment| matches!(segment, "." | "..")) {
            return Err(BackendError::InvalidKey {
                key: key.to_string(),
            });
        }
        Ok(self.kv_url(key.split('/')))
    }

    fn kv_url<'a>(&self, segments: impl IntoIterator<Item = &'a str>) -> Url {
        let mut url = self.base.clone();
        url.set_query(None);
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["v1", "kv"]).extend(segments);
        }
        url
    }

    fn send(&self, method: Method, url: Url, body: Vec<u8>) -> BackendResult<HttpResponse> {
        self.client
            .send(HttpRequest {
                method,
                url,
                token: self.token.clone(),
                body,
            })
            .map_err(BackendError::Transport)
    }
}

impl<C: HttpClient> KvBackend for ConsulBackend<C> {
    fn list_keys(&self) -> BackendResult<Vec<String>> {
        let mut url = self.kv_url([""]);
        url.set_query(Some("keys"));

        let response = self.send(Method::Get, url, Vec::new())?;
        match response.status {
            200 => serde_json::from_slice(&response.body)
                .map_err(|e| BackendError::InvalidResponse(format!("key list: {e}"))),
            404 => Ok(Vec::new()),
            _ => Err(unexpected(response)),
        }
    }

    fn get(&self, key: &str) -> BackendResult<Option<Vec<u8>>> {
        let mut url = self.key_url(key)?;
        url.set_query(Some("raw"));

        let response = self.send(Method::Get, url, Vec::new())?;
        match response.status {
            200 => Ok(Some(response.body)),
            404 => Ok(None),
            _ => Err(unexpected(response)),
        }
    }

    fn put(&self, key: &str, value: &[u8]) -> BackendResult<()> {
        let url = self.key_url(key)?;
        let response = self.send(Method::Put, url, value.to_vec())?;
        if response.status != 200 {
            return Err(unexpected(response));
        }
        match String::from_utf8_lossy(&response.body).trim() {
            "true" => Ok(()),
            "false" => Err(BackendError::Rejected {
                key: key.to_string(),
            }),
            other => Err(BackendError::InvalidResponse(format!(
                "put answered {other:?}"
            ))),
        }
    }
}

fn unexpected(response: HttpResponse) -> BackendError {
    let mut body = String::from_utf8_lossy(&response.body).trim().to_string();
    if body.len() > MAX_ERROR_BODY {
        let mut end = MAX_ERROR_BODY;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    BackendError::Status {
        status: response.status,
        body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loopback::{KvEmulator, LoopbackClient};
    use consul_sync_core::MemoryBackend;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn backend(store: Arc<MemoryBackend>) -> ConsulBackend<LoopbackClient<KvEmulator>> {
        ConsulBackend::new(
            "http://consul.test:8500",
            None,
            LoopbackClient::new(KvEmulator::new(store)),
        )
        .unwrap()
    }

    /// Answers every request with a fixed response and remembers the requests.
    struct Canned {
        response: HttpResponse,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl Canned {
        fn new(status: u16, body: &str) -> Self {
            Self {
                response: HttpResponse::new(status, body.as_bytes()),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    impl HttpClient for Canned {
        fn send(&self, request: HttpRequest) -> Result<HttpResponse, String> {
            self.seen.lock().push(request);
            Ok(self.response.clone())
        }
    }

    fn canned(status: u16, body: &str) -> ConsulBackend<Canned> {
        ConsulBackend::new("http://localhost:8500", None, Canned::new(status, body)).unwrap()
    }

    struct Unreachable;

    impl HttpClient for Unreachable {
        fn send(&self, _request: HttpRequest) -> Result<HttpResponse, String> {
            Err("connection refused".into())
        }
    }

    #[test]
    fn rejects_bad_addresses() {
        assert!(ConsulBackend::new("not a url", None, Unreachable).is_err());
        assert!(ConsulBackend::new("mailto:ops@example.com", None, Unreachable).is_err());
        assert!(ConsulBackend::new("ftp://consul:8500", None, Unreachable).is_err());
        assert!(ConsulBackend::new("https://consul:8501", None, Unreachable).is_ok());
    }

    #[test]
    fn key_urls_encode_segments() {
        let b = ConsulBackend::new("http://localhost:8500", None, Unreachable).unwrap();
        assert_eq!(
            b.key_url("serviceA/db/host").unwrap().as_str(),
            "http://localhost:8500/v1/kv/serviceA/db/host"
        );
        assert_eq!(
            b.key_url("dir/").unwrap().as_str(),
            "http://localhost:8500/v1/kv/dir/"
        );
        assert_eq!(
            b.key_url("a b/c?d#e").unwrap().as_str(),
            "http://localhost:8500/v1/kv/a%20b/c%3Fd%23e"
        );
    }

    #[test]
    fn base_path_is_kept() {
        let b = ConsulBackend::new("http://proxy:8080/consul/", None, Unreachable).unwrap();
        assert_eq!(
            b.key_url("k").unwrap().as_str(),
            "http://proxy:8080/consul/v1/kv/k"
        );
    }

    #[test]
    fn list_get_put_through_emulator() {
        let store = Arc::new(MemoryBackend::with_entries([
            ("serviceA/db/host", "x"),
            ("serviceA/", ""),
            ("space key", "v"),
        ]));
        let b = backend(Arc::clone(&store));

        assert_eq!(
            b.list_keys().unwrap(),
            vec!["serviceA/", "serviceA/db/host", "space key"]
        );
        assert_eq!(b.get("serviceA/db/host").unwrap(), Some(b"x".to_vec()));
        assert_eq!(b.get("space key").unwrap(), Some(b"v".to_vec()));
        assert_eq!(b.get("absent").unwrap(), None);

        b.put("localA/db/host", &[0, 159, 146, 150]).unwrap();
        assert_eq!(store.entries()["localA/db/host"], vec![0, 159, 146, 150]);
    }

    #[test]
    fn dot_segments_are_refused_before_sending() {
        let store = Arc::new(MemoryBackend::with_entries([
            ("team/secret", "original"),
            ("a/b", "1"),
        ]));
        let b = backend(Arc::clone(&store));

        for key in ["team/../secret", "cfg/./x", "..", ".", "a/b/.."] {
            assert_eq!(
                b.put(key, b"v"),
                Err(BackendError::InvalidKey { key: key.into() }),
                "put {key}"
            );
            assert_eq!(
                b.get(key),
                Err(BackendError::InvalidKey { key: key.into() }),
                "get {key}"
            );
        }

        assert!(b.client().server().requests().is_empty());
        assert_eq!(store.entries()["team/secret"], b"original".to_vec());
        assert_eq!(store.entries().len(), 2);
    }

    #[test]
    fn dots_inside_segments_are_ordinary() {
        let store = Arc::new(MemoryBackend::new());
        let b = backend(Arc::clone(&store));

        for key in ["a/.hidden", "v1.2/x", "a/.../b", "..a"] {
            b.put(key, b"v").unwrap();
            assert_eq!(b.get(key).unwrap(), Some(b"v".to_vec()), "{key}");
        }
        assert_eq!(store.entries().len(), 4);
    }

    #[test]
    fn empty_store_lists_nothing() {
        let b = backend(Arc::new(MemoryBackend::new()));
        assert!(b.list_keys().unwrap().is_empty());
    }

    #[test]
    fn token_is_sent() {
        let client = Canned::new(200, "true");
        let b = ConsulBackend::new("http://localhost:8500", Some("secret".into()), client).unwrap();
        b.put("k", b"v").unwrap();

        let seen = b.client.seen.lock();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].method, Method::Put);
        assert_eq!(seen[0].token.as_deref(), Some("secret"));
        assert_eq!(seen[0].body, b"v".to_vec());
    }

    #[test]
    fn empty_token_is_dropped() {
        let client = Canned::new(200, "[]");
        let b = ConsulBackend::new("http://localhost:8500", Some(String::new()), client).unwrap();
        b.list_keys().unwrap();
        assert_eq!(b.client.seen.lock()[0].token, None);
        assert_eq!(
            b.client.seen.lock()[0].url.as_str(),
            "http://localhost:8500/v1/kv/?keys"
        );
    }

    #[test]
    fn put_false_is_rejected() {
        let b = canned(200, "false\n");
        assert_eq!(
            b.put("k", b"v"),
            Err(BackendError::Rejected { key: "k".into() })
        );
    }

    #[test]
    fn error_status_is_reported() {
        let b = canned(403, "Permission denied");
        assert_eq!(
            b.get("k"),
            Err(BackendError::Status {
                status: 403,
                body: "Permission denied".into()
            })
        );
        assert!(matches!(b.list_keys(), Err(BackendError::Status { status: 403, .. })));
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "é".repeat(400);
        let err = unexpected(HttpResponse::new(500, body.as_bytes()));
        match err {
            BackendError::Status { body, .. } => assert!(body.len() <= MAX_ERROR_BODY),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn garbage_key_list_is_invalid() {
        let b = canned(200, "{}");
        assert!(matches!(b.list_keys(), Err(BackendError::InvalidResponse(_))));
    }

    #[test]
    fn transport_failure() {
        let b = ConsulBackend::new("http://localhost:8500", None, Unreachable).unwrap();
        assert_eq!(
            b.get("k"),
            Err(BackendError::Transport("connection refused".into()))
        );
    }
}
