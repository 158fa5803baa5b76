//! # kvstore
//!
//! In-memory key-value store for JSON values, served over HTTP.
//!
//! ## Features
//!
//! - Set / Get / Update / Delete / List over `/api/v1`
//! - Check-then-act atomic writes under a single engine-wide `RwLock`
//! - Per-request deadlines checked before any storage work starts
//! - Structural error taxonomy mapped onto HTTP status codes
//! - Liveness / readiness probes and a Prometheus metrics endpoint
//!
//! ## Example
//!
//! ```ignore
//! use kvstore::service::{KvStoreService, RequestContext, SetRequest};
//! use kvstore::storage::MemoryStorage;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let service = KvStoreService::new(Arc::new(MemoryStorage::new()));
//! let ctx = RequestContext::with_timeout(Duration::from_secs(5));
//! service.set(&ctx, SetRequest { key: "k".into(), value: "v".into() })?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────────┐     ┌───────────────┐
//! │ HTTP adapter │────▶│ KvStoreService   │────▶│ MemoryStorage │
//! │ (axum, JSON, │     │ (context checks, │     │ (RwLock,      │
//! │  status map) │◀────│  error wrapping) │◀────│  HashMap)     │
//! └──────────────┘     └──────────────────┘     └───────────────┘
//! ```

// Modules
pub mod config;
pub mod error;
pub mod health;
pub mod metrics;
pub mod prelude;
pub mod server;
pub mod service;
pub mod storage;

// Re-exports for convenience
pub use error::{ContextError, ErrorKind, KvError, KvStoreError, Result, ServiceError};

/// Crate version reported by the liveness probe
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Build identifier reported by the health probes, set through
/// `KVSTORE_BUILD_INFORMATION` at compile time
pub const BUILD_INFORMATION: &str = match option_env!("KVSTORE_BUILD_INFORMATION") {
    Some(info) => info,
    None => concat!(env!("CARGO_PKG_NAME"), "-", env!("CARGO_PKG_VERSION")),
};
