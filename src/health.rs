//! Liveness, readiness and metrics endpoints

use crate::metrics::Metrics;
use axum::extract::State;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Health endpoint state
pub struct HealthState {
    server_env: String,
    metrics: Option<Arc<Metrics>>,
    ready: AtomicBool,
}

impl HealthState {
    /// Create a new health state; `metrics` is `None` when metrics are disabled
    pub fn new(server_env: impl Into<String>, metrics: Option<Arc<Metrics>>) -> Self {
        Self {
            server_env: server_env.into(),
            metrics,
            ready: AtomicBool::new(false),
        }
    }

    /// Set the ready state
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }

    /// Check if the server is ready
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}

/// Routes for `/healthz/live`, `/healthz/ready` and `/metrics`
pub fn health_routes(state: Arc<HealthState>) -> Router {
    Router::new()
        .route("/healthz/live", get(live))
        .route("/healthz/ready", get(ready))
        .route("/metrics", get(metrics))
        .with_state(state)
}

async fn live(State(state): State<Arc<HealthState>>) -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "server": state.server_env,
            "version": crate::VERSION,
            "build_information": crate::BUILD_INFORMATION,
            "message": "liveness is OK!, server is ready to accept connections",
        })),
    )
        .into_response()
}

async fn ready(State(state): State<Arc<HealthState>>) -> Response {
    if state.is_ready() {
        (
            StatusCode::OK,
            Json(json!({
                "server": state.server_env,
                "version": crate::VERSION,
                "build_information": crate::BUILD_INFORMATION,
                "message": "readiness is OK!, server is ready to accept connections",
            })),
        )
            .into_response()
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "message": "not ready" })),
        )
            .into_response()
    }
}

async fn metrics(State(state): State<Arc<HealthState>>) -> Response {
    match &state.metrics {
        Some(metrics) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            metrics.gather(),
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "metrics disabled" })),
        )
            .into_response(),
    }
}
