//! API error types with HTTP response mapping.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{SecondsFormat, Utc};
use domain::DomainError;
use reporting::ReportError;
use serde::Serialize;
use uuid::Uuid;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Domain logic error.
    Domain(DomainError),
    /// Report delivery error.
    Report(ReportError),
    /// Internal server error.
    Internal(String),
}

/// Body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub message: String,
    pub trace_id: String,
    pub timestamp: String,
}

const INTERNAL_MESSAGE: &str = "An unexpected error occurred. Please try again later.";

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let trace_id = Uuid::new_v4().simple().to_string();
        let (status, kind, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "NotFound", msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BadRequest", msg),
            ApiError::Domain(err) => domain_error_to_response(err, &trace_id),
            ApiError::Report(ReportError::Domain(err)) => domain_error_to_response(err, &trace_id),
            ApiError::Report(err @ ReportError::Mail(_)) => {
                tracing::error!(%trace_id, error = %err, "report delivery failed");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "ServiceUnavailable",
                    err.to_string(),
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(%trace_id, error = %msg, "internal server error");
                internal()
            }
        };

        if status.is_client_error() {
            tracing::warn!(%trace_id, status = status.as_u16(), %message, "request rejected");
        }

        let body = ErrorBody {
            kind,
            message,
            trace_id,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        (status, Json(body)).into_response()
    }
}

fn internal() -> (StatusCode, &'static str, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "InternalError",
        INTERNAL_MESSAGE.to_string(),
    )
}

fn domain_error_to_response(err: DomainError, trace_id: &str) -> (StatusCode, &'static str, String) {
    match &err {
        DomainError::NotFound { .. } => (StatusCode::NOT_FOUND, "NotFound", err.to_string()),
        DomainError::BusinessRule(_) | DomainError::InsufficientStock { .. } => {
            (StatusCode::BAD_REQUEST, "BusinessRule", err.to_string())
        }
        DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "Validation", err.to_string()),
        DomainError::Duplicate { .. } => (StatusCode::CONFLICT, "Conflict", err.to_string()),
        DomainError::Store(_) => {
            tracing::error!(%trace_id, error = %err, "store failure");
            internal()
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        ApiError::Domain(err)
    }
}

impl From<ReportError> for ApiError {
    fn from(err: ReportError) -> Self {
        ApiError::Report(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_domain_errors_map_to_status_codes() {
        let cases = [
            (DomainError::not_found("Product", "x"), StatusCode::NOT_FOUND),
            (DomainError::rule("nope"), StatusCode::BAD_REQUEST),
            (DomainError::validation("bad"), StatusCode::BAD_REQUEST),
            (
                DomainError::InsufficientStock {
                    product: "Lamp".to_string(),
                    requested: 3,
                    available: 1,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                DomainError::Duplicate {
                    entity: "Customer",
                    field: "email",
                },
                StatusCode::CONFLICT,
            ),
        ];
        for (err, expected) in cases {
            let (status, _) = body_of(ApiError::Domain(err)).await;
            assert_eq!(status, expected);
        }
    }

    #[tokio::test]
    async fn test_envelope_shape() {
        let (status, json) = body_of(ApiError::Domain(DomainError::rule("Cart is empty"))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["type"], "BusinessRule");
        assert_eq!(json["message"], "Cart is empty");
        assert_eq!(json["trace_id"].as_str().unwrap().len(), 32);
        assert!(json["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[tokio::test]
    async fn test_internal_errors_hide_details() {
        let (status, json) = body_of(ApiError::Internal("pool exhausted".to_string())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["message"], INTERNAL_MESSAGE);
    }
}
