//! Order placement and lifecycle endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::{CustomerId, OrderId, OrderStatus};
use domain::{CreateOrder, OrderView, PaymentView};
use serde::Deserialize;
use store::Store;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

// -- Request types --

#[derive(Deserialize)]
pub struct StatusQuery {
    pub status: Option<OrderStatus>,
}

#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    pub status: OrderStatus,
}

fn not_found(id: OrderId) -> ApiError {
    ApiError::NotFound(format!("Order with ID {id} not found"))
}

// -- Handlers --

/// POST /api/orders: turns the customer's cart into an order.
#[tracing::instrument(skip(state, req), fields(customer_id = %req.customer_id))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(req): ApiJson<CreateOrder>,
) -> Result<(StatusCode, Json<OrderView>), ApiError> {
    let order = state.orders.create_order(req).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

/// GET /api/orders/{id}
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<OrderView>, ApiError> {
    state
        .orders
        .inner()
        .get_order(id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// GET /api/orders/by-number/{number}
pub async fn by_number<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(number): ApiPath<String>,
) -> Result<Json<OrderView>, ApiError> {
    state
        .orders
        .inner()
        .get_order_by_number(&number)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Order {number} not found")))
}

/// GET /api/orders/customer/{customer_id}
pub async fn for_customer<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(customer_id): ApiPath<CustomerId>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    Ok(Json(state.orders.inner().customer_orders(customer_id).await?))
}

/// GET /api/orders?status=: every order, or those in one status.
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiQuery(query): ApiQuery<StatusQuery>,
) -> Result<Json<Vec<OrderView>>, ApiError> {
    let orders = match query.status {
        Some(status) => state.orders.inner().orders_by_status(status).await?,
        None => state.orders.inner().list_orders().await?,
    };
    Ok(Json(orders))
}

/// PATCH /api/orders/{id}/status
#[tracing::instrument(skip(state, req))]
pub async fn update_status<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<OrderId>,
    ApiJson(req): ApiJson<StatusUpdateRequest>,
) -> Result<Json<OrderView>, ApiError> {
    Ok(Json(state.orders.update_order_status(id, req.status).await?))
}

/// POST /api/orders/{id}/cancel
#[tracing::instrument(skip(state))]
pub async fn cancel<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<StatusCode, ApiError> {
    if state.orders.cancel_order(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}

/// GET /api/orders/{id}/payment
pub async fn payment<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<OrderId>,
) -> Result<Json<PaymentView>, ApiError> {
    state
        .payments
        .payment_for_order(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("No payment recorded for order {id}")))
}
