//! Handlers for the `/api/v1` key-value endpoints

use super::AppState;
use super::response::error_json;
use crate::error::ErrorKind;
use crate::service::{SetRequest, UpdateRequest};
use axum::Json;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Query, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// JSON body accepted by set and update
#[derive(Debug, Deserialize)]
struct ItemRequest {
    #[serde(default)]
    key: String,
    #[serde(default)]
    value: Option<Value>,
}

/// Validate a set/update body, returning the key and value
fn decode_item(body: Result<Bytes, BytesRejection>) -> Result<(String, Value), Response> {
    let body = body.map_err(|e| error_json(e.status(), e.body_text()))?;
    if body.is_empty() {
        return Err(error_json(StatusCode::BAD_REQUEST, "empty body/payload"));
    }

    let request: ItemRequest = serde_json::from_slice(&body)
        .map_err(|e| error_json(StatusCode::BAD_REQUEST, e.to_string()))?;

    if request.key.is_empty() {
        return Err(error_json(StatusCode::BAD_REQUEST, "key is empty"));
    }

    match request.value {
        Some(value) => Ok((request.key, value)),
        None => Err(error_json(StatusCode::BAD_REQUEST, "value is empty")),
    }
}

/// Extract the `key` query parameter for get/delete
fn key_param(params: &HashMap<String, String>) -> Result<&str, Response> {
    if params.is_empty() {
        return Err(error_json(StatusCode::NOT_FOUND, "key query param required"));
    }
    params
        .get("key")
        .map(String::as_str)
        .ok_or_else(|| error_json(StatusCode::NOT_FOUND, "key not present"))
}

/// POST /api/v1/set
pub(crate) async fn set(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    state.metrics.cmd_set.inc();
    let _timer = state.metrics.request_latency.start_timer();

    let (key, value) = match decode_item(body) {
        Ok(item) => item,
        Err(response) => {
            state.metrics.bad_requests.inc();
            return response;
        }
    };

    let ctx = state.request_context();
    match state.service.set(&ctx, SetRequest { key, value }) {
        Ok(item) => {
            state.metrics.entries.inc();
            (StatusCode::CREATED, Json(item)).into_response()
        }
        Err(e) => state.error_response("kvstorehandler.Set", &e),
    }
}

/// GET /api/v1/get?key=
pub(crate) async fn get(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.metrics.cmd_get.inc();
    let _timer = state.metrics.request_latency.start_timer();

    let key = match key_param(&params) {
        Ok(key) => key,
        Err(response) => {
            state.metrics.bad_requests.inc();
            return response;
        }
    };

    let ctx = state.request_context();
    match state.service.get(&ctx, key) {
        Ok(item) => {
            state.metrics.get_hits.inc();
            (StatusCode::OK, Json(item)).into_response()
        }
        Err(e) => {
            if e.kind() == ErrorKind::KeyNotFound {
                state.metrics.get_misses.inc();
            }
            state.error_response("kvstorehandler.Get", &e)
        }
    }
}

/// PUT /api/v1/update
pub(crate) async fn update(
    State(state): State<Arc<AppState>>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    state.metrics.cmd_update.inc();
    let _timer = state.metrics.request_latency.start_timer();

    let (key, value) = match decode_item(body) {
        Ok(item) => item,
        Err(response) => {
            state.metrics.bad_requests.inc();
            return response;
        }
    };

    let ctx = state.request_context();
    match state.service.update(&ctx, UpdateRequest { key, value }) {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => state.error_response("kvstorehandler.Update", &e),
    }
}

/// DELETE /api/v1/delete?key=
pub(crate) async fn delete(
    State(state): State<Arc<AppState>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    state.metrics.cmd_delete.inc();
    let _timer = state.metrics.request_latency.start_timer();

    let key = match key_param(&params) {
        Ok(key) => key,
        Err(response) => {
            state.metrics.bad_requests.inc();
            return response;
        }
    };

    let ctx = state.request_context();
    match state.service.delete(&ctx, key) {
        Ok(()) => {
            state.metrics.entries.dec();
            StatusCode::NO_CONTENT.into_response()
        }
        Err(e) => state.error_response("kvstorehandler.Delete", &e),
    }
}

/// GET /api/v1/list
pub(crate) async fn list(State(state): State<Arc<AppState>>) -> Response {
    state.metrics.cmd_list.inc();
    let _timer = state.metrics.request_latency.start_timer();

    let ctx = state.request_context();
    match state.service.list(&ctx) {
        Ok(items) if items.is_empty() => error_json(StatusCode::NOT_FOUND, "nothing found"),
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => state.error_response("kvstorehandler.List", &e),
    }
}

/// Fallback for a known path hit with the wrong method
pub(crate) async fn method_not_allowed(method: Method) -> Response {
    error_json(
        StatusCode::METHOD_NOT_ALLOWED,
        format!("method {method} not allowed"),
    )
}
