//! # consul-sync testkit
//!
//! Test utilities for consul-sync.
//!
//! This crate provides:
//! - A temporary environment with in-memory local and staging stores
//! - Orchestrators over those stores, either direct or through the Consul
//!   HTTP mapping served in-process
//! - Property-based generators for keys, prefixes and snapshots
//!
//! ## Usage
//!
//! ```rust
//! use consul_sync_core::PrefixRewrite;
//! use consul_sync_testkit::TestEnv;
//!
//! let env = TestEnv::new();
//! env.staging.insert("serviceA/db/host", "10.0.0.1");
//!
//! let orchestrator = env.memory_orchestrator();
//! orchestrator.export_staging().unwrap();
//! orchestrator
//!     .import(&PrefixRewrite::new("serviceA/", "localA/"))
//!     .unwrap();
//!
//! assert_eq!(env.local.entries()["localA/db/host"], b"10.0.0.1".to_vec());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
}

pub use fixtures::*;
pub use generators::*;
