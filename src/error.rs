//! Error types for kvstore

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Main error type for kvstore (bootstrap, configuration, IO)
#[derive(Error, Debug)]
pub enum KvStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid listen address: {0}")]
    Addr(#[from] std::net::AddrParseError),
}

pub type Result<T> = std::result::Result<T, KvStoreError>;

/// Structural classification of every error the core can produce.
///
/// The HTTP layer maps errors to status codes by kind only, never by
/// message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    KeyExists,
    KeyNotFound,
    Cancelled,
    DeadlineExceeded,
    Unknown,
}

impl ErrorKind {
    /// Stable lower-case label, used for metrics and log fields
    pub fn as_str(self) -> &'static str {
        match self {
            Self::KeyExists => "key_exists",
            Self::KeyNotFound => "key_not_found",
            Self::Cancelled => "cancelled",
            Self::DeadlineExceeded => "deadline_exceeded",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Cause = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Typed storage error.
///
/// Every occurrence is a fresh value built from one of the sentinel
/// constructors, so request-scoped data attached with [`KvError::with_data`]
/// never leaks between callers.
#[derive(Debug, Clone)]
pub struct KvError {
    kind: ErrorKind,
    message: &'static str,
    data: Option<String>,
    loggable: bool,
    cause: Option<Cause>,
}

impl KvError {
    fn sentinel(kind: ErrorKind, message: &'static str, loggable: bool) -> Self {
        Self {
            kind,
            message,
            data: None,
            loggable,
            cause: None,
        }
    }

    /// The key is already present
    pub fn key_exists() -> Self {
        Self::sentinel(ErrorKind::KeyExists, "key exist", true)
    }

    /// The key is absent
    pub fn key_not_found() -> Self {
        Self::sentinel(ErrorKind::KeyNotFound, "key not found", false)
    }

    /// Anything the taxonomy has no name for
    pub fn unknown() -> Self {
        Self::sentinel(ErrorKind::Unknown, "unknown error", true)
    }

    /// Attach context data (usually the offending key)
    #[must_use]
    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    /// Drop previously attached context data
    #[must_use]
    pub fn without_data(mut self) -> Self {
        self.data = None;
        self
    }

    /// Record a lower-level cause
    #[must_use]
    pub fn wrap<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn is(&self, kind: ErrorKind) -> bool {
        self.kind == kind
    }

    pub fn message(&self) -> &str {
        self.message
    }

    pub fn data(&self) -> Option<&str> {
        self.data.as_deref()
    }

    pub fn is_loggable(&self) -> bool {
        self.loggable
    }

    /// Text shown to HTTP clients: `<message>[, <data>]`.
    ///
    /// Never includes the wrapped cause.
    pub fn client_message(&self) -> String {
        match &self.data {
            Some(data) => format!("{}, {data}", self.message),
            None => self.message.to_string(),
        }
    }
}

impl fmt::Display for KvError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{cause}, {}", self.message),
            None => f.write_str(self.message),
        }
    }
}

impl std::error::Error for KvError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn std::error::Error + 'static))
    }
}

/// Reason a request context refused new work
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextError {
    #[error("context canceled")]
    Cancelled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,
}

/// Errors returned by the request service
#[derive(Error, Debug, Clone)]
pub enum ServiceError {
    /// The context was already done when the operation was entered
    #[error(transparent)]
    Context(#[from] ContextError),

    /// The storage engine rejected the operation
    #[error("{operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: KvError,
    },
}

impl ServiceError {
    pub(crate) fn storage(operation: &'static str, source: KvError) -> Self {
        Self::Storage { operation, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Context(ContextError::Cancelled) => ErrorKind::Cancelled,
            Self::Context(ContextError::DeadlineExceeded) => ErrorKind::DeadlineExceeded,
            Self::Storage { source, .. } => source.kind(),
        }
    }

    /// The typed storage error, if this came from the engine
    pub fn kv_error(&self) -> Option<&KvError> {
        match self {
            Self::Storage { source, .. } => Some(source),
            Self::Context(_) => None,
        }
    }
}
