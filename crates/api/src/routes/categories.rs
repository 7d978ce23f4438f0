//! Category endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::CategoryId;
use domain::{CategoryView, CreateCategory, UpdateCategory};
use serde::Deserialize;
use store::Store;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

/// POST /api/categories
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(req): ApiJson<CreateCategory>,
) -> Result<(StatusCode, Json<CategoryView>), ApiError> {
    let category = state.categories.create_category(req).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// GET /api/categories
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<CategoryView>>, ApiError> {
    Ok(Json(state.categories.list_categories().await?))
}

/// GET /api/categories/root
pub async fn roots<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<CategoryView>>, ApiError> {
    Ok(Json(state.categories.root_categories().await?))
}

#[derive(Deserialize)]
pub struct NameQuery {
    pub name: String,
}

/// GET /api/categories/by-name?name=
pub async fn by_name<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiQuery(query): ApiQuery<NameQuery>,
) -> Result<Json<CategoryView>, ApiError> {
    state
        .categories
        .get_category_by_name(&query.name)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Category with name {} not found", query.name)))
}

/// GET /api/categories/{id}
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Json<CategoryView>, ApiError> {
    state
        .categories
        .get_category(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Category with ID {id} not found")))
}

/// GET /api/categories/{id}/subcategories
pub async fn subcategories<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<Json<Vec<CategoryView>>, ApiError> {
    Ok(Json(state.categories.subcategories(id).await?))
}

/// PUT /api/categories/{id}
#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<CategoryId>,
    ApiJson(req): ApiJson<UpdateCategory>,
) -> Result<Json<CategoryView>, ApiError> {
    Ok(Json(state.categories.update_category(id, req).await?))
}

/// DELETE /api/categories/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<CategoryId>,
) -> Result<StatusCode, ApiError> {
    if state.categories.delete_category(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Category with ID {id} not found")))
    }
}
