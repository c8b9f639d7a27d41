//! Error types for consul-sync.
//!
//! Two layers exist. [`BackendError`] describes a single failed call against a
//! key-value store and is usually recoverable (the caller records it against
//! one key and moves on). [`SyncError`] is fatal: it aborts the operation
//! that raised it.

use crate::backend::StoreRole;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Result type for a single backend call.
pub type BackendResult<T> = Result<T, BackendError>;

/// Errors raised by a key-value backend call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The request never produced a response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The store answered with an unexpected HTTP status.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The store acknowledged the write but refused it.
    #[error("write rejected for key {key:?}")]
    Rejected {
        /// Key that was refused.
        key: String,
    },

    /// The key cannot be addressed without changing its meaning.
    #[error("key {key:?} contains a '.' or '..' segment")]
    InvalidKey {
        /// Key that was refused before any request was sent.
        key: String,
    },

    /// The response body could not be interpreted.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The store is not reachable (used by in-memory stores in tests).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Fatal errors. Any of these terminates the running operation.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The client for a store could not be constructed.
    #[error("failed to create {role} client: {message}")]
    Connect {
        /// Store the client was meant for.
        role: StoreRole,
        /// Underlying cause.
        message: String,
    },

    /// The initial key listing failed.
    #[error("failed to list {role} keys: {source}")]
    ListKeys {
        /// Store being listed.
        role: StoreRole,
        /// Backend failure.
        #[source]
        source: BackendError,
    },

    /// A snapshot file could not be read.
    #[error("failed to read {}: {source}", path.display())]
    SnapshotRead {
        /// Snapshot path.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: io::Error,
    },

    /// A snapshot file is not a valid record array.
    #[error("failed to parse {}: {source}", path.display())]
    SnapshotParse {
        /// Snapshot path.
        path: PathBuf,
        /// JSON failure.
        #[source]
        source: serde_json::Error,
    },

    /// A snapshot file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    SnapshotWrite {
        /// Snapshot path.
        path: PathBuf,
        /// I/O failure.
        #[source]
        source: io::Error,
    },

    /// Records could not be serialized.
    #[error("failed to encode snapshot: {0}")]
    SnapshotEncode(#[from] serde_json::Error),

    /// The backup timestamp could not be rendered.
    #[error("failed to format timestamp: {0}")]
    Timestamp(#[from] time::error::Format),

    /// Configuration is unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SyncError {
    /// Creates a connect error for the given store.
    pub fn connect(role: StoreRole, message: impl Into<String>) -> Self {
        Self::Connect {
            role,
            message: message.into(),
        }
    }
}
