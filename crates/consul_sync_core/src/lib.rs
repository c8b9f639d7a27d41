//! # consul-sync core
//!
//! Moves key-value pairs between two Consul KV stores through snapshot
//! files.
//!
//! This crate provides:
//! - The prefix filter and rewrite engine ([`PrefixRewrite`])
//! - Snapshot files ([`SnapshotStore`], [`Record`])
//! - The key-value backend abstraction ([`KvBackend`], [`Connector`])
//! - An in-memory backend for tests ([`MemoryBackend`])
//! - Backup, export and import sequencing ([`SyncOrchestrator`])
//!
//! ## Error policy
//!
//! Setup failures are fatal and surface as [`SyncError`]. Failures on a
//! single key are collected as [`RecordError`]s in the operation report and
//! never stop the batch. Records the rewrite engine declines are reported as
//! [`RecordOutcome::Skipped`], which is not a failure.
//!
//! ## Example
//!
//! ```rust
//! use consul_sync_core::{PrefixRewrite, RewriteDecision};
//!
//! let rewrite = PrefixRewrite::new("serviceA/", "localA/");
//! assert!(rewrite.selects("serviceA/db/host"));
//! assert_eq!(
//!     rewrite.rewrite("serviceA/db/host"),
//!     RewriteDecision::Selected("localA/db/host".into())
//! );
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod config;
mod error;
mod memory;
mod orchestrator;
mod outcome;
mod record;
mod rewrite;
pub mod snapshot;

pub use backend::{Connector, KvBackend, StoreRole};
pub use config::{
    Endpoint, SyncConfig, DEFAULT_LOCAL_ADDR, DEFAULT_REQUEST_TIMEOUT, DEFAULT_STAGING_ADDR,
    LOCAL_ADDR_VAR, LOCAL_TOKEN_VAR, STAGING_ADDR_VAR, STAGING_TOKEN_VAR,
};
pub use error::{BackendError, BackendResult, SyncError, SyncResult};
pub use memory::{MemoryBackend, MemoryConnector};
pub use orchestrator::{SyncOrchestrator, SyncPlan};
pub use outcome::{ImportReport, RecordError, RecordOutcome, RunSummary, SnapshotReport};
pub use record::Record;
pub use rewrite::{Plan, PlannedRecord, PrefixRewrite, RewriteDecision, SkipReason};
pub use snapshot::{SnapshotStore, EXPORT_FILE_NAME};
