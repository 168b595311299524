//! Authgate - a prefix-routing reverse proxy gated by a central auth service.
//!
//! Authgate sits in front of several backend services and makes one
//! authentication decision point for all of them. Every inbound request is
//! routed by its first path segment, optionally bypassed via per-mapping
//! whitelist globs, and otherwise verified against an external auth endpoint
//! before being forwarded. The library exposes the building blocks so the
//! pipeline can be embedded or tested without a running process.
//!
//! # Features
//! - Prefix-based routing from an ordered set of mappings
//! - Whitelist bypass with glob patterns compiled once at startup
//! - Forward-auth round trip: 200 passes, anything else comes back as 401
//! - Direction-aware header allow-lists with process-lifetime memoization
//! - Verbatim forwarding: original method, headers and body reach the backend,
//!   responses stream back unbuffered
//! - YAML/JSON/TOML configuration with startup validation
//! - Structured tracing via `tracing` and graceful shutdown
//!
//! # Quick Example
//! ```no_run
//! use std::{sync::Arc, time::Duration};
//!
//! use authgate::{HttpClientAdapter, ProxyService, ports::http_client::HttpClient};
//!
//! # #[tokio::main] async fn main() -> eyre::Result<()> {
//! let config = Arc::new(authgate::config::load_config("config.yaml").await?);
//! let client: Arc<dyn HttpClient> =
//!     Arc::new(HttpClientAdapter::new(Duration::from_millis(config.client.timeout_ms))?);
//! let proxy = Arc::new(ProxyService::new(config, client));
//! // Wire this into the provided HttpHandler adapter (see binary crate)
//! # Ok(()) }
//! ```
//!
//! # Architecture
//! The crate separates **ports** (traits) from **adapters** (implementations)
//! while keeping the decision pipeline inside `core`. The core performs no I/O
//! of its own; both outbound legs go through the `HttpClient` port.
//!
//! # Error Handling
//! All fallible APIs return `eyre::Result<T>` or a domain specific error type.
//! Per-request failures never cross request boundaries; only configuration
//! errors at startup are fatal.
//!
//! # Concurrency & Data Structures
//! Configuration and the target table are immutable after startup. The only
//! shared mutable state is the pair of header policy memo caches, which use
//! `scc::HashMap` for safe concurrent first writes.
// Re-export public modules with explicit visibility controls
pub mod config;
pub mod ports;
pub mod tracing_setup;
pub mod utils;

// These modules are implementation details and should not be directly used by users
pub mod adapters;
pub mod core;

// Re-export the specific types needed by the binary crate
pub use crate::{
    adapters::{HttpClientAdapter, HttpHandler, build_router},
    core::ProxyService,
    ports::http_client::HttpClient,
    utils::GracefulShutdown,
};
