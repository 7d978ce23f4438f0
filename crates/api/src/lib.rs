//! HTTP API server with observability for the online shop.
//!
//! Provides REST endpoints for customers, the catalog, carts, orders,
//! payments and monthly reports, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, patch, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use store::Store;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::ApiError;
pub use state::{AppState, create_default_state};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: Store>(state: Arc<AppState<S>>, metrics_handle: PrometheusHandle) -> Router {
    use routes::{carts, categories, customers, health, orders, payments, products, reports};

    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    let api = Router::new()
        // Customers
        .route("/customers", post(customers::create::<S>).get(customers::list::<S>))
        .route("/customers/by-email", get(customers::by_email::<S>))
        .route(
            "/customers/{id}",
            get(customers::get::<S>)
                .put(customers::update::<S>)
                .delete(customers::delete::<S>),
        )
        .route(
            "/customers/{id}/addresses",
            get(customers::addresses::<S>).post(customers::add_address::<S>),
        )
        // Categories
        .route("/categories", post(categories::create::<S>).get(categories::list::<S>))
        .route("/categories/root", get(categories::roots::<S>))
        .route("/categories/by-name", get(categories::by_name::<S>))
        .route(
            "/categories/{id}",
            get(categories::get::<S>)
                .put(categories::update::<S>)
                .delete(categories::delete::<S>),
        )
        .route("/categories/{id}/subcategories", get(categories::subcategories::<S>))
        // Products
        .route("/products", post(products::create::<S>).get(products::list::<S>))
        .route("/products/active", get(products::active::<S>))
        .route("/products/by-sku", get(products::by_sku::<S>))
        .route("/products/search", get(products::search::<S>))
        .route("/products/by-category/{id}", get(products::by_category::<S>))
        .route(
            "/products/{id}",
            get(products::get::<S>)
                .put(products::update::<S>)
                .delete(products::delete::<S>),
        )
        .route("/products/{id}/stock", patch(products::update_stock::<S>))
        // Carts
        .route("/carts/cleanup", post(carts::cleanup::<S>))
        .route("/carts/customer/{customer_id}", get(carts::for_customer::<S>))
        .route("/carts/customer/{customer_id}/items", post(carts::add_item::<S>))
        .route("/carts/{id}", get(carts::get::<S>).delete(carts::clear::<S>))
        .route(
            "/carts/{id}/items/{item_id}",
            put(carts::update_item::<S>).delete(carts::remove_item::<S>),
        )
        // Orders
        .route("/orders", post(orders::create::<S>).get(orders::list::<S>))
        .route("/orders/by-number/{number}", get(orders::by_number::<S>))
        .route("/orders/customer/{customer_id}", get(orders::for_customer::<S>))
        .route("/orders/{id}", get(orders::get::<S>))
        .route("/orders/{id}/status", patch(orders::update_status::<S>))
        .route("/orders/{id}/cancel", post(orders::cancel::<S>))
        .route("/orders/{id}/payment", get(orders::payment::<S>))
        // Payments
        .route("/payments", post(payments::create::<S>).get(payments::list::<S>))
        .route("/payments/{id}", get(payments::get::<S>))
        .route("/payments/{id}/status", patch(payments::update_status::<S>))
        .route("/payments/{id}/refund", post(payments::refund::<S>))
        // Reports
        .route("/reports/monthly/{customer_id}", post(reports::monthly::<S>))
        .route("/reports/trigger-monthly", post(reports::trigger_monthly::<S>));

    Router::new()
        .nest("/api", api)
        .route("/health", get(health::ready::<S>))
        .route("/health/live", get(health::live))
        .route("/health/ready", get(health::ready::<S>))
        .with_state(state)
        .merge(metrics_router)
        .layer(axum::middleware::from_fn(routes::metrics::track_requests))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
