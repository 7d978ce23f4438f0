//! Integration tests for the API server.

use std::sync::{Arc, OnceLock};

use api::AppState;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use cache::InMemoryCache;
use metrics_exporter_prometheus::PrometheusHandle;
use reporting::InMemoryMailer;
use serde_json::{Value, json};
use store::InMemoryStore;
use tower::ServiceExt;

static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

fn get_metrics_handle() -> PrometheusHandle {
    METRICS_HANDLE
        .get_or_init(|| {
            api::routes::metrics::install_recorder().expect("failed to install Prometheus recorder")
        })
        .clone()
}

struct TestApp {
    router: axum::Router,
    mailer: InMemoryMailer,
}

impl TestApp {
    fn new() -> Self {
        let mailer = InMemoryMailer::new();
        let state = Arc::new(AppState::new(
            InMemoryStore::new(),
            Arc::new(InMemoryCache::new(1_000)),
            Arc::new(mailer.clone()),
        ));
        Self {
            router: api::create_app(state, get_metrics_handle()),
            mailer,
        }
    }

    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send("GET", uri, None).await
    }

    async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send("POST", uri, Some(body)).await
    }

    async fn create_customer(&self, email: &str) -> String {
        let (status, json) = self
            .post(
                "/api/customers",
                json!({ "email": email, "first_name": "Linus", "last_name": "Pauling" }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        json["id"].as_str().unwrap().to_string()
    }

    async fn create_address(&self, customer_id: &str) -> String {
        let (status, json) = self
            .post(
                &format!("/api/customers/{customer_id}/addresses"),
                json!({
                    "street": "10 Market St",
                    "city": "Springfield",
                    "state": "IL",
                    "country": "US",
                    "postal_code": "62701"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        json["id"].as_str().unwrap().to_string()
    }

    async fn create_product(&self, sku: &str, price_cents: i64, stock: u32) -> String {
        let (status, json) = self
            .post(
                "/api/products",
                json!({
                    "name": format!("Product {sku}"),
                    "price_cents": price_cents,
                    "sku": sku,
                    "stock_quantity": stock
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        json["id"].as_str().unwrap().to_string()
    }

    /// Puts `quantity` of a product in the customer's cart and places the order.
    async fn place_order(&self, customer_id: &str, product_id: &str, quantity: u32) -> Value {
        let address_id = self.create_address(customer_id).await;
        let (status, cart) = self
            .post(
                &format!("/api/carts/customer/{customer_id}/items"),
                json!({ "product_id": product_id, "quantity": quantity }),
            )
            .await;
        assert_eq!(status, StatusCode::OK);

        let (status, order) = self
            .post(
                "/api/orders",
                json!({
                    "customer_id": customer_id,
                    "cart_id": cart["id"],
                    "shipping_address_id": address_id,
                    "billing_address_id": address_id,
                    "payment_method": "CreditCard"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{order}");
        order
    }

    async fn stock_of(&self, product_id: &str) -> u64 {
        let (_, product) = self.get(&format!("/api/products/{product_id}")).await;
        product["stock_quantity"].as_u64().unwrap()
    }
}

mod health {
    use super::*;

    #[tokio::test]
    async fn test_live_and_ready() {
        let app = TestApp::new();

        let (status, json) = app.get("/health/live").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");

        let (status, json) = app.get("/health/ready").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["database"], "up");

        let (status, _) = app.get("/health").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let app = TestApp::new();
        app.get("/health/live").await;

        let response = app
            .router
            .clone()
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()["content-type"].to_str().unwrap();
        assert!(content_type.starts_with("text/plain"));
    }
}

mod errors {
    use super::*;

    #[tokio::test]
    async fn test_missing_resource_uses_envelope() {
        let app = TestApp::new();
        let (status, json) = app
            .get("/api/customers/00000000-0000-0000-0000-000000000000")
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["type"], "NotFound");
        assert!(json["message"].is_string());
        assert!(json["trace_id"].is_string());
        assert!(json["timestamp"].is_string());
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let app = TestApp::new();
        let response = app
            .router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/customers")
                    .header("content-type", "application/json")
                    .body(Body::from("{ not json"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["type"], "BadRequest");
    }

    #[tokio::test]
    async fn test_invalid_id_is_bad_request() {
        let app = TestApp::new();
        let (status, json) = app.get("/api/products/not-a-uuid").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["type"], "BadRequest");
    }

    #[tokio::test]
    async fn test_duplicate_email_is_rejected() {
        let app = TestApp::new();
        app.create_customer("twice@example.com").await;

        let (status, json) = app
            .post(
                "/api/customers",
                json!({ "email": "TWICE@example.com", "first_name": "A", "last_name": "B" }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["type"], "BusinessRule");
    }

    #[tokio::test]
    async fn test_validation_failure() {
        let app = TestApp::new();
        let (status, json) = app
            .post(
                "/api/products",
                json!({ "name": "Free lunch", "price_cents": 0, "sku": "FREE-1" }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(json["type"] == "Validation" || json["type"] == "BusinessRule");
    }
}

mod catalog {
    use super::*;

    #[tokio::test]
    async fn test_product_lookups() {
        let app = TestApp::new();
        let id = app.create_product("LAMP-01", 3999, 5).await;

        let (status, json) = app.get("/api/products/by-sku?sku=lamp-01").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["id"], id.as_str());

        let (status, json) = app.get("/api/products/search?q=lamp").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 1);

        let (status, json) = app
            .send(
                "PATCH",
                &format!("/api/products/{id}/stock"),
                Some(json!({ "stock_quantity": 12 })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["stock_quantity"], 12);
        assert_eq!(app.stock_of(&id).await, 12);
    }

    #[tokio::test]
    async fn test_category_with_products_cannot_be_deleted() {
        let app = TestApp::new();
        let (status, category) = app
            .post("/api/categories", json!({ "name": "Lighting" }))
            .await;
        assert_eq!(status, StatusCode::CREATED);
        let category_id = category["id"].as_str().unwrap();

        let (status, _) = app
            .post(
                "/api/products",
                json!({
                    "name": "Desk lamp",
                    "price_cents": 2500,
                    "sku": "LAMP-02",
                    "stock_quantity": 3,
                    "category_id": category_id
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, json) = app
            .get(&format!("/api/products/by-category/{category_id}"))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json.as_array().unwrap().len(), 1);

        let (status, _) = app
            .send("DELETE", &format!("/api/categories/{category_id}"), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, json) = app.get("/api/categories/by-name?name=lighting").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["id"], category_id);
    }
}

mod customers {
    use super::*;

    #[tokio::test]
    async fn test_deleted_customer_cart_is_not_served_from_cache() {
        let app = TestApp::new();
        let customer_id = app.create_customer("leaving@example.com").await;

        let (status, cart) = app.get(&format!("/api/carts/customer/{customer_id}")).await;
        assert_eq!(status, StatusCode::OK);
        let cart_id = cart["id"].as_str().unwrap();
        let (status, _) = app.get(&format!("/api/carts/{cart_id}")).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = app
            .send("DELETE", &format!("/api/customers/{customer_id}"), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, json) = app.get(&format!("/api/carts/customer/{customer_id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["type"], "NotFound");
        let (status, _) = app.get(&format!("/api/carts/{cart_id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

mod order_flow {
    use super::*;

    #[tokio::test]
    async fn test_place_and_cancel_moves_stock() {
        let app = TestApp::new();
        let customer_id = app.create_customer("buyer@example.com").await;
        let product_id = app.create_product("MUG-01", 1200, 10).await;

        let order = app.place_order(&customer_id, &product_id, 3).await;
        assert_eq!(order["status"], "Pending");
        assert_eq!(order["total_amount_cents"], 3600);
        let number = order["order_number"].as_str().unwrap();
        assert!(number.starts_with("ORD-"));
        assert_eq!(app.stock_of(&product_id).await, 7);

        let (status, cart) = app.get(&format!("/api/carts/customer/{customer_id}")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(cart["items"].as_array().unwrap().is_empty());

        let (status, found) = app.get(&format!("/api/orders/by-number/{number}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["id"], order["id"]);

        let order_id = order["id"].as_str().unwrap();
        let (status, _) = app
            .send("POST", &format!("/api/orders/{order_id}/cancel"), None)
            .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(app.stock_of(&product_id).await, 10);

        let (_, cancelled) = app.get("/api/orders?status=Cancelled").await;
        assert_eq!(cancelled.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_insufficient_stock_is_rejected() {
        let app = TestApp::new();
        let customer_id = app.create_customer("greedy@example.com").await;
        let product_id = app.create_product("RARE-01", 9900, 1).await;

        let (status, json) = app
            .post(
                &format!("/api/carts/customer/{customer_id}/items"),
                json!({ "product_id": product_id, "quantity": 2 }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["type"], "BusinessRule");
        assert_eq!(app.stock_of(&product_id).await, 1);
    }

    #[tokio::test]
    async fn test_shipped_order_cannot_be_cancelled() {
        let app = TestApp::new();
        let customer_id = app.create_customer("shipper@example.com").await;
        let product_id = app.create_product("BOX-01", 500, 4).await;
        let order = app.place_order(&customer_id, &product_id, 1).await;
        let order_id = order["id"].as_str().unwrap();

        for next in ["Processing", "Shipped"] {
            let (status, json) = app
                .send(
                    "PATCH",
                    &format!("/api/orders/{order_id}/status"),
                    Some(json!({ "status": next })),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(json["status"], next);
        }

        let (status, json) = app
            .send("POST", &format!("/api/orders/{order_id}/cancel"), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["message"], "Cannot cancel shipped or delivered orders");
        assert_eq!(app.stock_of(&product_id).await, 3);
    }

    #[tokio::test]
    async fn test_payment_lifecycle() {
        let app = TestApp::new();
        let customer_id = app.create_customer("payer@example.com").await;
        let product_id = app.create_product("PEN-01", 250, 20).await;
        let order = app.place_order(&customer_id, &product_id, 4).await;
        let order_id = order["id"].as_str().unwrap();

        let (status, payment) = app
            .post(
                "/api/payments",
                json!({
                    "order_id": order_id,
                    "payment_method": "PayPal",
                    "amount_cents": 1000,
                    "transaction_id": "TXN-1"
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(payment["status"], "Pending");
        let payment_id = payment["id"].as_str().unwrap();

        let (status, _) = app
            .post(
                "/api/payments",
                json!({ "order_id": order_id, "payment_method": "PayPal", "amount_cents": 1000 }),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, payment) = app
            .send(
                "PATCH",
                &format!("/api/payments/{payment_id}/status"),
                Some(json!({ "status": "Completed", "gateway_response": "approved" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payment["status"], "Completed");

        let (_, order) = app.get(&format!("/api/orders/{order_id}")).await;
        assert_eq!(order["status"], "Processing");

        let (status, payment) = app
            .post(&format!("/api/payments/{payment_id}/refund"), json!({}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(payment["status"], "Refunded");

        let (status, found) = app.get(&format!("/api/orders/{order_id}/payment")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(found["id"], payment_id);

        let (status, refunded) = app.get("/api/payments?status=Refunded").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(refunded.as_array().unwrap().len(), 1);

        let (status, _) = app
            .get("/api/payments?status=Refunded&older_than_minutes=5")
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_out_of_range_payment_age_is_bad_request() {
        let app = TestApp::new();

        for minutes in [i64::MAX, i64::MAX / 60_000, -5] {
            let (status, json) = app
                .get(&format!(
                    "/api/payments?status=Pending&older_than_minutes={minutes}"
                ))
                .await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{minutes}");
            assert!(json["type"] == "BadRequest" || json["type"] == "Validation");
            assert!(json["trace_id"].is_string());
        }

        let (status, json) = app
            .get("/api/payments?status=Pending&older_than_minutes=30")
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(json.as_array().unwrap().is_empty());
    }
}

mod reports {
    use super::*;

    #[tokio::test]
    async fn test_monthly_report_for_customer() {
        let app = TestApp::new();
        let customer_id = app.create_customer("reader@example.com").await;
        let product_id = app.create_product("BOOK-01", 1500, 10).await;
        app.place_order(&customer_id, &product_id, 2).await;

        let month = chrono::Utc::now().format("%Y-%m").to_string();
        let (status, json) = app
            .post(
                &format!("/api/reports/monthly/{customer_id}?month={month}"),
                json!({}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["sent"], true);
        assert!(
            json["message"]
                .as_str()
                .unwrap()
                .starts_with("Monthly report sent successfully for ")
        );
        assert_eq!(app.mailer.sent_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_month_is_bad_request() {
        let app = TestApp::new();
        let customer_id = app.create_customer("calendar@example.com").await;
        let (status, _) = app
            .post(
                &format!("/api/reports/monthly/{customer_id}?month=2024-13"),
                json!({}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_trigger_monthly_returns_summary() {
        let app = TestApp::new();
        app.create_customer("idle@example.com").await;

        let (status, json) = app.post("/api/reports/trigger-monthly", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["message"], "Monthly reports triggered successfully");
        assert_eq!(json["skipped"], 1);
        assert_eq!(json["sent"], 0);
    }
}
