//! # consul-sync HTTP
//!
//! Consul KV over HTTP.
//!
//! This crate provides:
//! - [`ConsulBackend`], a [`consul_sync_core::KvBackend`] for the Consul KV API
//! - [`HttpConnector`], which builds backends from configured endpoints
//! - The [`HttpClient`] seam with a blocking reqwest implementation
//! - [`LoopbackClient`] and [`KvEmulator`] for network-free tests
//!
//! Each call is a single attempt; there is no retry layer.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod connector;
mod consul;
mod loopback;

pub use client::{HttpClient, HttpRequest, HttpResponse, Method, ReqwestClient, TOKEN_HEADER};
pub use connector::HttpConnector;
pub use consul::ConsulBackend;
pub use loopback::{KvEmulator, LoopbackClient, LoopbackServer};
