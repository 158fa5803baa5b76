//! Prelude module for common imports.
//!
//! # Usage
//!
//! ```ignore
//! use kvstore::prelude::*;
//! ```

// Error types
pub use crate::error::{ContextError, ErrorKind, KvError, KvStoreError, Result, ServiceError};

// Configuration
pub use crate::config::{Config, MetricsConfig, ServerConfig, StorageConfig};

// Storage
pub use crate::storage::{MemoryDb, MemoryStorage, Storer};

// Service
pub use crate::service::{
    ItemResponse, KvStoreService, ListResponse, RequestContext, SetRequest, UpdateRequest,
};

// Health and metrics
pub use crate::health::HealthState;
pub use crate::metrics::Metrics;

// Server
pub use crate::server::{AppState, Server};

// Common external crates
pub use std::sync::Arc;
pub use tracing::{debug, error, info, trace, warn};
