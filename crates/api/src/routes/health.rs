//! Health check endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Serialize;
use store::Store;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub database: &'static str,
    /// State of the mail circuit breaker, when mail is guarded by one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_circuit: Option<String>,
}

/// GET /health/live: the process is up.
pub async fn live() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

/// GET /health and GET /health/ready: the store answers.
pub async fn ready<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> (StatusCode, Json<ReadinessResponse>) {
    let email_circuit = state
        .mail_policy
        .as_ref()
        .map(|p| p.circuit_breaker().state().to_string());

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(ReadinessResponse {
                status: "ok",
                database: "up",
                email_circuit,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ReadinessResponse {
                    status: "unavailable",
                    database: "down",
                    email_circuit,
                }),
            )
        }
    }
}
