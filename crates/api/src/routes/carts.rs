//! Shopping cart endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::{CartId, CartItemId, CustomerId};
use domain::{AddCartItem, CartView};
use serde::{Deserialize, Serialize};
use store::Store;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct QuantityRequest {
    /// Zero or less removes the line.
    pub quantity: i64,
}

#[derive(Serialize)]
pub struct CleanupResponse {
    pub removed: u64,
}

/// GET /api/carts/customer/{customer_id}
pub async fn for_customer<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(customer_id): ApiPath<CustomerId>,
) -> Result<Json<CartView>, ApiError> {
    Ok(Json(state.carts.get_or_create_cart(customer_id).await?))
}

/// GET /api/carts/{id}
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<CartId>,
) -> Result<Json<CartView>, ApiError> {
    state
        .carts
        .get_cart(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Cart with ID {id} not found")))
}

/// POST /api/carts/customer/{customer_id}/items
#[tracing::instrument(skip(state, req))]
pub async fn add_item<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(customer_id): ApiPath<CustomerId>,
    ApiJson(req): ApiJson<AddCartItem>,
) -> Result<Json<CartView>, ApiError> {
    Ok(Json(state.carts.add_item(customer_id, req).await?))
}

/// PUT /api/carts/{id}/items/{item_id}
#[tracing::instrument(skip(state, req))]
pub async fn update_item<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath((id, item_id)): ApiPath<(CartId, CartItemId)>,
    ApiJson(req): ApiJson<QuantityRequest>,
) -> Result<Json<CartView>, ApiError> {
    Ok(Json(
        state
            .carts
            .update_item_quantity(id, item_id, req.quantity)
            .await?,
    ))
}

/// DELETE /api/carts/{id}/items/{item_id}
#[tracing::instrument(skip(state))]
pub async fn remove_item<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath((id, item_id)): ApiPath<(CartId, CartItemId)>,
) -> Result<Json<CartView>, ApiError> {
    Ok(Json(state.carts.remove_item(id, item_id).await?))
}

/// DELETE /api/carts/{id}
#[tracing::instrument(skip(state))]
pub async fn clear<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<CartId>,
) -> Result<StatusCode, ApiError> {
    if state.carts.clear_cart(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Cart with ID {id} not found")))
    }
}

/// POST /api/carts/cleanup
#[tracing::instrument(skip(state))]
pub async fn cleanup<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<CleanupResponse>, ApiError> {
    let removed = state.carts.remove_expired_carts().await?;
    Ok(Json(CleanupResponse { removed }))
}
