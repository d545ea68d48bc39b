//! API error types with HTTP response mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use courier::CourierError;
use domain::{DomainError, PartialFailure};
use serde_json::json;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Courier lookup error.
    Courier(CourierError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => error_body(StatusCode::BAD_REQUEST, msg),
            ApiError::Domain(DomainError::PartialFailure(failure)) => {
                partial_failure_response(failure)
            }
            ApiError::Domain(err) => {
                let status = domain_status(&err);
                if status.is_server_error() {
                    tracing::error!(error = %err, "request failed");
                }
                error_body(status, err.to_string())
            }
            ApiError::Courier(err) => {
                let status = courier_status(&err);
                if status.is_server_error() {
                    tracing::error!(error = %err, "courier lookup failed");
                }
                error_body(status, err.to_string())
            }
        }
    }
}

fn error_body(status: StatusCode, message: String) -> Response {
    let body = json!({ "error": message, "status": false });
    (status, Json(body)).into_response()
}

fn partial_failure_response(failure: PartialFailure) -> Response {
    tracing::error!(
        order_id = %failure.order_id,
        failed = failure.failures.len(),
        "order created with missing lines"
    );
    let body = json!({
        "error": failure.to_string(),
        "order_id": failure.order_id,
        "details": failure.failures,
        "status": false,
    });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

fn domain_status(err: &DomainError) -> StatusCode {
    match err {
        DomainError::Validation(_) => StatusCode::BAD_REQUEST,
        DomainError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::Storage(_) | DomainError::PartialFailure(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn courier_status(err: &CourierError) -> StatusCode {
    match err {
        CourierError::Validation(_) => StatusCode::BAD_REQUEST,
        CourierError::Upstream { .. } | CourierError::Http(_) => StatusCode::BAD_GATEWAY,
        CourierError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<CourierError> for ApiError {
    fn from(err: CourierError) -> Self {
        ApiError::Courier(err)
    }
}
