//! Product catalog endpoints, served through the cache.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::{CategoryId, ProductId};
use domain::{CreateProduct, ProductView, UpdateProduct};
use serde::Deserialize;
use store::Store;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SkuQuery {
    pub sku: String,
}

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Deserialize)]
pub struct StockRequest {
    pub stock_quantity: u32,
}

fn not_found(id: ProductId) -> ApiError {
    ApiError::NotFound(format!("Product with ID {id} not found"))
}

/// POST /api/products
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(req): ApiJson<CreateProduct>,
) -> Result<(StatusCode, Json<ProductView>), ApiError> {
    let product = state.products.create_product(req).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// GET /api/products
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ProductView>>, ApiError> {
    Ok(Json(state.products.list_products().await?))
}

/// GET /api/products/active
pub async fn active<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<ProductView>>, ApiError> {
    Ok(Json(state.products.active_products().await?))
}

/// GET /api/products/{id}
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<Json<ProductView>, ApiError> {
    state
        .products
        .get_product(id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// GET /api/products/by-sku?sku=
pub async fn by_sku<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiQuery(query): ApiQuery<SkuQuery>,
) -> Result<Json<ProductView>, ApiError> {
    state
        .products
        .get_product_by_sku(&query.sku)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Product with SKU {} not found", query.sku)))
}

/// GET /api/products/search?q=
pub async fn search<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<Vec<ProductView>>, ApiError> {
    Ok(Json(state.products.search_products(&query.q).await?))
}

/// GET /api/products/by-category/{id}
pub async fn by_category<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Json<Vec<ProductView>>, ApiError> {
    Ok(Json(state.products.products_by_category(id).await?))
}

/// PUT /api/products/{id}
#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(req): ApiJson<UpdateProduct>,
) -> Result<Json<ProductView>, ApiError> {
    state
        .products
        .update_product(id, req)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// PATCH /api/products/{id}/stock
#[tracing::instrument(skip(state, req))]
pub async fn update_stock<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<ProductId>,
    ApiJson(req): ApiJson<StockRequest>,
) -> Result<Json<ProductView>, ApiError> {
    state
        .products
        .update_stock(id, req.stock_quantity)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(id))
}

/// DELETE /api/products/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<ProductId>,
) -> Result<StatusCode, ApiError> {
    if state.products.delete_product(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(id))
    }
}
