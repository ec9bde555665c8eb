//! Shared fixtures for the HTTP test suites

#![allow(dead_code)]

use axum_test::TestServer;
use comanda::prelude::*;
use serde_json::{Value, json};

pub const SECRET: &str = "integration-test-secret-0123456789abcdef";
pub const ADMIN_EMAIL: &str = "cocina@comanda.pe";
pub const ADMIN_PASSWORD: &str = "Cocina2024";

pub struct Harness {
    pub server: TestServer,
    pub store: InMemoryStore,
    pub gateway: ScriptedGateway,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.auth.session_secret = SECRET.to_string();
    config.gateway.simulate = true;
    config
}

pub async fn harness() -> Harness {
    harness_with(ScriptedGateway::approving()).await
}

pub async fn harness_with(gateway: ScriptedGateway) -> Harness {
    let store = InMemoryStore::new();

    let auth = AdminAuthService::new(
        std::sync::Arc::new(store.clone()),
        SessionGuard::new(SECRET, chrono::Duration::hours(24)),
        8,
    );
    auth.register("Cocina", ADMIN_EMAIL, ADMIN_PASSWORD, AdminRole::Cocinero)
        .await
        .expect("admin should register");

    let app = ServerBuilder::new()
        .with_config(test_config())
        .with_store(store.clone())
        .with_gateway(gateway.clone())
        .build()
        .expect("Failed to build app");

    let server = TestServer::try_new(app).expect("Failed to create test server");

    Harness {
        server,
        store,
        gateway,
    }
}

impl Harness {
    pub async fn product(&self, name: &str, price: &str, available: bool) -> Product {
        self.store
            .create_product(NewProduct {
                category_id: None,
                name: name.to_string(),
                description: None,
                price: price.parse().expect("valid price"),
                available,
                image_url: None,
            })
            .await
            .expect("product should be created")
    }

    pub async fn customer(&self, email: &str) -> i64 {
        let response = self
            .server
            .post("/customers")
            .json(&json!({ "name": "Rosa Quispe", "email": email }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Value>()["id"].as_i64().expect("customer id")
    }

    pub async fn admin_token(&self) -> String {
        let response = self
            .server
            .post("/admin/login")
            .json(&json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
            .await;
        response.assert_status_ok();
        response.json::<Value>()["token"]
            .as_str()
            .expect("token")
            .to_string()
    }

    /// Place an order and return its JSON
    pub async fn order(&self, customer_id: i64, items: Value) -> Value {
        let response = self
            .server
            .post("/orders")
            .json(&json!({ "customer_id": customer_id, "items": items }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json()
    }

    pub async fn pay(&self, order_id: i64) -> axum_test::TestResponse {
        self.server
            .post("/payments")
            .json(&json!({
                "order_id": order_id,
                "payment_token": "tkn_test_visa",
                "email": "rosa@example.pe",
            }))
            .await
    }

    pub async fn set_status(&self, token: &str, order_id: i64, status: &str) -> axum_test::TestResponse {
        self.server
            .put(&format!("/orders/{order_id}/status"))
            .authorization_bearer(token)
            .json(&json!({ "status": status }))
            .await
    }

    pub async fn payments(&self, order_id: i64) -> Vec<Payment> {
        self.store
            .payments_for_order(order_id)
            .await
            .expect("payments should load")
    }
}
