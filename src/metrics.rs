//! Prometheus metrics for kvstore

use crate::error::ErrorKind;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Registry};

/// Global metrics instance
pub struct Metrics {
    pub registry: Registry,

    // Request counters
    pub cmd_set: IntCounter,
    pub cmd_get: IntCounter,
    pub cmd_update: IntCounter,
    pub cmd_delete: IntCounter,
    pub cmd_list: IntCounter,

    // Hit/miss counters
    pub get_hits: IntCounter,
    pub get_misses: IntCounter,

    // Store size
    pub entries: IntGauge,

    // Latency histograms
    pub request_latency: Histogram,

    // Error counters
    pub bad_requests: IntCounter,
    pub key_exists_errors: IntCounter,
    pub key_not_found_errors: IntCounter,
    pub timeout_errors: IntCounter,
    pub unknown_errors: IntCounter,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        let registry = Registry::new();

        let cmd_set = IntCounter::new("kvstore_cmd_set_total", "Total set requests").unwrap();
        let cmd_get = IntCounter::new("kvstore_cmd_get_total", "Total get requests").unwrap();
        let cmd_update =
            IntCounter::new("kvstore_cmd_update_total", "Total update requests").unwrap();
        let cmd_delete =
            IntCounter::new("kvstore_cmd_delete_total", "Total delete requests").unwrap();
        let cmd_list = IntCounter::new("kvstore_cmd_list_total", "Total list requests").unwrap();

        let get_hits = IntCounter::new("kvstore_get_hits_total", "Total get hits").unwrap();
        let get_misses = IntCounter::new("kvstore_get_misses_total", "Total get misses").unwrap();

        let entries = IntGauge::new("kvstore_entries", "Entries currently stored").unwrap();

        let request_latency = Histogram::with_opts(
            HistogramOpts::new(
                "kvstore_request_latency_seconds",
                "Request latency in seconds",
            )
            .buckets(vec![
                0.0001, 0.0005, 0.001, 0.002, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0,
            ]),
        )
        .unwrap();

        let bad_requests =
            IntCounter::new("kvstore_bad_requests_total", "Total malformed requests").unwrap();
        let key_exists_errors = IntCounter::new(
            "kvstore_key_exists_errors_total",
            "Total set requests on existing keys",
        )
        .unwrap();
        let key_not_found_errors = IntCounter::new(
            "kvstore_key_not_found_errors_total",
            "Total requests on missing keys",
        )
        .unwrap();
        let timeout_errors = IntCounter::new(
            "kvstore_timeout_errors_total",
            "Total requests refused by a cancelled or expired context",
        )
        .unwrap();
        let unknown_errors =
            IntCounter::new("kvstore_unknown_errors_total", "Total unclassified errors").unwrap();

        // Register all metrics
        registry.register(Box::new(cmd_set.clone())).unwrap();
        registry.register(Box::new(cmd_get.clone())).unwrap();
        registry.register(Box::new(cmd_update.clone())).unwrap();
        registry.register(Box::new(cmd_delete.clone())).unwrap();
        registry.register(Box::new(cmd_list.clone())).unwrap();
        registry.register(Box::new(get_hits.clone())).unwrap();
        registry.register(Box::new(get_misses.clone())).unwrap();
        registry.register(Box::new(entries.clone())).unwrap();
        registry.register(Box::new(request_latency.clone())).unwrap();
        registry.register(Box::new(bad_requests.clone())).unwrap();
        registry
            .register(Box::new(key_exists_errors.clone()))
            .unwrap();
        registry
            .register(Box::new(key_not_found_errors.clone()))
            .unwrap();
        registry.register(Box::new(timeout_errors.clone())).unwrap();
        registry.register(Box::new(unknown_errors.clone())).unwrap();

        Self {
            registry,
            cmd_set,
            cmd_get,
            cmd_update,
            cmd_delete,
            cmd_list,
            get_hits,
            get_misses,
            entries,
            request_latency,
            bad_requests,
            key_exists_errors,
            key_not_found_errors,
            timeout_errors,
            unknown_errors,
        }
    }

    /// Count a failed request by error kind
    pub fn record_error(&self, kind: ErrorKind) {
        match kind {
            ErrorKind::KeyExists => self.key_exists_errors.inc(),
            ErrorKind::KeyNotFound => self.key_not_found_errors.inc(),
            ErrorKind::Cancelled | ErrorKind::DeadlineExceeded => self.timeout_errors.inc(),
            ErrorKind::Unknown => self.unknown_errors.inc(),
        }
    }

    /// Get Prometheus formatted metrics
    pub fn gather(&self) -> String {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
