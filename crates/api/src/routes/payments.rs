//! Payment endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::{PaymentId, PaymentStatus};
use domain::{PaymentView, RecordPayment};
use serde::Deserialize;
use store::Store;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PaymentStatusRequest {
    pub status: PaymentStatus,
    #[serde(default)]
    pub gateway_response: Option<String>,
}

#[derive(Deserialize)]
pub struct PaymentListQuery {
    pub status: PaymentStatus,
    /// Only payments older than this many minutes.
    #[serde(default)]
    pub older_than_minutes: Option<i64>,
}

/// GET /api/payments?status=&older_than_minutes=
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiQuery(query): ApiQuery<PaymentListQuery>,
) -> Result<Json<Vec<PaymentView>>, ApiError> {
    let payments = match (query.status, query.older_than_minutes) {
        (PaymentStatus::Pending, Some(minutes)) => {
            let age = chrono::Duration::try_minutes(minutes)
                .filter(|age| *age >= chrono::Duration::zero())
                .ok_or_else(|| {
                    ApiError::BadRequest(format!("Invalid older_than_minutes: {minutes}"))
                })?;
            state.payments.stale_pending_payments(age).await?
        }
        (_, Some(_)) => {
            return Err(ApiError::BadRequest(
                "older_than_minutes only applies to Pending payments".to_string(),
            ));
        }
        (status, None) => state.payments.payments_by_status(status).await?,
    };
    Ok(Json(payments))
}

/// POST /api/payments
#[tracing::instrument(skip(state, req), fields(order_id = %req.order_id))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(req): ApiJson<RecordPayment>,
) -> Result<(StatusCode, Json<PaymentView>), ApiError> {
    let payment = state.payments.process_payment(req).await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// GET /api/payments/{id}
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<PaymentId>,
) -> Result<Json<PaymentView>, ApiError> {
    state
        .payments
        .get_payment(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Payment with ID {id} not found")))
}

/// PATCH /api/payments/{id}/status
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<PaymentId>,
    ApiJson(req): ApiJson<PaymentStatusRequest>,
) -> Result<Json<PaymentView>, ApiError> {
    let payment = state
        .payments
        .update_payment_status(id, req.status, req.gateway_response)
        .await?;
    Ok(Json(payment))
}

/// POST /api/payments/{id}/refund
#[tracing::instrument(skip(state))]
pub async fn refund<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<PaymentId>,
) -> Result<Json<PaymentView>, ApiError> {
    Ok(Json(state.payments.refund_payment(id).await?))
}
