//! Configuration for kvstore

use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub metrics: MetricsConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on
    pub listen_addr: String,

    /// Deployment environment reported by the liveness probe
    pub server_env: String,

    /// Per-request context timeout in milliseconds
    pub request_timeout_ms: u64,

    /// Upper bound on graceful shutdown in seconds
    pub shutdown_timeout_secs: u64,

    /// Number of Tokio worker threads (0 = number of CPUs)
    pub worker_threads: usize,

    /// Default tracing filter when RUST_LOG is unset
    pub log_level: String,

    /// Answer expired/cancelled contexts with 504 instead of 500
    pub gateway_timeout_on_deadline: bool,

    /// Largest accepted request body in bytes (0 = unlimited)
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            server_env: "production".to_string(),
            request_timeout_ms: 5000,
            shutdown_timeout_secs: 10,
            worker_threads: 0,
            log_level: "info".to_string(),
            gateway_timeout_on_deadline: true,
            max_body_bytes: 0,
        }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Parsed `listen_addr`
    pub fn socket_addr(&self) -> crate::Result<SocketAddr> {
        Ok(self.listen_addr.parse()?)
    }
}

/// Storage configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Entries loaded into the store at startup
    pub initial_entries: HashMap<String, serde_json::Value>,
}

/// Metrics configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Enable the /metrics endpoint
    pub enabled: bool,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &str) -> crate::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML document
    pub fn from_toml(contents: &str) -> crate::Result<Self> {
        toml::from_str(contents)
            .map_err(|e| crate::KvStoreError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load configuration from environment variables or use defaults
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("KVSTORE_LISTEN_ADDR") {
            config.server.listen_addr = addr;
        }

        if let Ok(env) = std::env::var("SERVER_ENV")
            && !env.is_empty()
        {
            config.server.server_env = env;
        }

        if let Ok(level) = std::env::var("LOG_LEVEL")
            && !level.is_empty()
        {
            config.server.log_level = level;
        }

        if let Ok(timeout) = std::env::var("KVSTORE_REQUEST_TIMEOUT_MS")
            && let Ok(ms) = timeout.parse()
        {
            config.server.request_timeout_ms = ms;
        }

        if let Ok(limit) = std::env::var("KVSTORE_MAX_BODY_BYTES")
            && let Ok(bytes) = limit.parse()
        {
            config.server.max_body_bytes = bytes;
        }

        if let Ok(enabled) = std::env::var("KVSTORE_METRICS_ENABLED") {
            config.metrics.enabled = enabled.to_lowercase() == "true" || enabled == "1";
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.listen_addr, "0.0.0.0:8000");
        assert_eq!(config.server.server_env, "production");
        assert_eq!(config.server.request_timeout(), Duration::from_secs(5));
        assert_eq!(config.server.shutdown_timeout(), Duration::from_secs(10));
        assert!(config.server.gateway_timeout_on_deadline);
        assert_eq!(config.server.max_body_bytes, 0);
        assert!(config.storage.initial_entries.is_empty());
        assert!(config.metrics.enabled);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml(
            r#"
            [server]
            listen_addr = "127.0.0.1:9000"
            request_timeout_ms = 250

            [storage.initial_entries]
            "user:1" = { name = "a" }
            greeting = "hello"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.listen_addr, "127.0.0.1:9000");
        assert_eq!(config.server.request_timeout(), Duration::from_millis(250));
        assert_eq!(config.server.server_env, "production");
        assert_eq!(
            config.storage.initial_entries.get("user:1"),
            Some(&serde_json::json!({"name": "a"}))
        );
        assert_eq!(
            config.storage.initial_entries.get("greeting"),
            Some(&serde_json::json!("hello"))
        );
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[metrics]\nenabled = false").unwrap();

        let config = Config::from_file(file.path().to_str().unwrap()).unwrap();
        assert!(!config.metrics.enabled);
    }

    #[test]
    fn test_from_file_errors() {
        let err = Config::from_file("/nonexistent/kvstore.toml").unwrap_err();
        assert!(matches!(err, crate::KvStoreError::Io(_)));

        let err = Config::from_toml("[server\nlisten_addr = ").unwrap_err();
        assert!(matches!(err, crate::KvStoreError::Config(_)));
    }

    #[test]
    fn test_socket_addr() {
        let config = ServerConfig::default();
        assert_eq!(
            config.socket_addr().unwrap(),
            "0.0.0.0:8000".parse::<SocketAddr>().unwrap()
        );

        let bad = ServerConfig {
            listen_addr: "localhost".to_string(),
            ..ServerConfig::default()
        };
        let err = bad.socket_addr().unwrap_err();
        assert!(matches!(err, crate::KvStoreError::Addr(_)));
    }
}
