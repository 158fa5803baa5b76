//! Translation of service outcomes into HTTP responses

use crate::error::{ErrorKind, ServiceError};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use tracing::error;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// `{"error": "<message>"}` with the given status
pub(crate) fn error_json(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Status code for an error kind
pub(crate) fn status_for(kind: ErrorKind, gateway_timeout: bool) -> StatusCode {
    match kind {
        ErrorKind::KeyNotFound => StatusCode::NOT_FOUND,
        ErrorKind::KeyExists => StatusCode::CONFLICT,
        ErrorKind::Cancelled | ErrorKind::DeadlineExceeded if gateway_timeout => {
            StatusCode::GATEWAY_TIMEOUT
        }
        ErrorKind::Cancelled | ErrorKind::DeadlineExceeded | ErrorKind::Unknown => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Build the error response for a failed service call.
///
/// Loggable storage errors are logged here, before the response is written.
pub(crate) fn service_error(
    operation: &'static str,
    err: &ServiceError,
    gateway_timeout: bool,
) -> Response {
    let status = status_for(err.kind(), gateway_timeout);

    let message = match err {
        ServiceError::Context(ctx_err) => ctx_err.to_string(),
        ServiceError::Storage { source, .. } => {
            let message = source.client_message();
            if source.is_loggable() {
                error!(operation, kind = %source.kind(), error = %err, "{}", message);
            }
            message
        }
    };

    error_json(status, message)
}
