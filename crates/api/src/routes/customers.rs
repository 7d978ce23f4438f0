//! Customer and address endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use common::CustomerId;
use domain::{AddressView, CreateAddress, CreateCustomer, CustomerView, UpdateCustomer};
use serde::Deserialize;
use store::Store;

use crate::error::ApiError;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

/// POST /api/customers
#[tracing::instrument(skip(state, req))]
pub async fn create<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiJson(req): ApiJson<CreateCustomer>,
) -> Result<(StatusCode, Json<CustomerView>), ApiError> {
    let customer = state.customers.inner().create_customer(req).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// GET /api/customers
pub async fn list<S: Store>(
    State(state): State<Arc<AppState<S>>>,
) -> Result<Json<Vec<CustomerView>>, ApiError> {
    Ok(Json(state.customers.inner().list_customers().await?))
}

/// GET /api/customers/{id}
pub async fn get<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<CustomerId>,
) -> Result<Json<CustomerView>, ApiError> {
    state
        .customers
        .inner()
        .get_customer(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Customer with ID {id} not found")))
}

/// GET /api/customers/by-email?email=
pub async fn by_email<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiQuery(query): ApiQuery<EmailQuery>,
) -> Result<Json<CustomerView>, ApiError> {
    state
        .customers
        .inner()
        .get_customer_by_email(&query.email)
        .await?
        .map(Json)
        .ok_or_else(|| {
            ApiError::NotFound(format!("Customer with email {} not found", query.email))
        })
}

/// PUT /api/customers/{id}
#[tracing::instrument(skip(state, req))]
pub async fn update<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<CustomerId>,
    ApiJson(req): ApiJson<UpdateCustomer>,
) -> Result<Json<CustomerView>, ApiError> {
    Ok(Json(state.customers.inner().update_customer(id, req).await?))
}

/// DELETE /api/customers/{id}
#[tracing::instrument(skip(state))]
pub async fn delete<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<CustomerId>,
) -> Result<StatusCode, ApiError> {
    if state.customers.delete_customer(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound(format!("Customer with ID {id} not found")))
    }
}

/// GET /api/customers/{id}/addresses
pub async fn addresses<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<CustomerId>,
) -> Result<Json<Vec<AddressView>>, ApiError> {
    Ok(Json(state.customers.inner().list_addresses(id).await?))
}

/// POST /api/customers/{id}/addresses
#[tracing::instrument(skip(state, req))]
pub async fn add_address<S: Store>(
    State(state): State<Arc<AppState<S>>>,
    ApiPath(id): ApiPath<CustomerId>,
    ApiJson(req): ApiJson<CreateAddress>,
) -> Result<(StatusCode, Json<AddressView>), ApiError> {
    let address = state.customers.inner().add_address(id, req).await?;
    Ok((StatusCode::CREATED, Json(address)))
}
