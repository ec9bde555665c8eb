//! End-to-end order flow through the HTTP API
//!
//! Storefront cart → order → card payment → kitchen status changes, driven
//! against the in-memory store and the scripted gateway.

mod common;

use axum::http::StatusCode;
use comanda::auth::hash_password;
use comanda::prelude::*;
use common::{ADMIN_EMAIL, harness};
use serde_json::{Value, json};

// =============================================================================
// Health Check Tests
// =============================================================================

mod health_tests {
    use super::*;

    #[tokio::test]
    async fn test_health_endpoints() {
        let h = harness().await;
        for path in ["/health", "/healthz"] {
            let response = h.server.get(path).await;
            response.assert_status_ok();
            let body: Value = response.json();
            assert_eq!(body["status"], "ok");
            assert_eq!(body["service"], "comanda");
        }
    }
}

// =============================================================================
// Order Creation Tests
// =============================================================================

mod order_creation_tests {
    use super::*;

    #[tokio::test]
    async fn test_server_recomputes_total() {
        let h = harness().await;
        let product = h.product("Lomo saltado", "10.00", true).await;
        let customer_id = h.customer("rosa@example.pe").await;

        let response = h
            .server
            .post("/orders")
            .json(&json!({
                "customer_id": customer_id,
                "items": [{ "product_id": product.id, "quantity": 2 }],
                "total": "999.00",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let order: Order = response.json();
        assert_eq!(order.total, "20.00".parse::<Decimal>().unwrap());
        assert_eq!(order.status, OrderStatus::Pendiente);
        assert_eq!(order.lines.len(), 1);
        assert_eq!(order.lines[0].unit_price, "10.00".parse::<Decimal>().unwrap());
        assert_eq!(order.total, order.lines_total());
        assert!(order.order_number.starts_with("PED-"));
    }

    #[tokio::test]
    async fn test_oversized_quantity_creates_nothing() {
        let h = harness().await;
        let product = h.product("Lomo saltado", "10.00", true).await;
        let customer_id = h.customer("rosa@example.pe").await;

        for quantity in [MAX_LINE_QUANTITY + 1, i64::MAX] {
            let response = h
                .server
                .post("/orders")
                .json(&json!({
                    "customer_id": customer_id,
                    "items": [{ "product_id": product.id, "quantity": quantity }],
                }))
                .await;
            response.assert_status(StatusCode::BAD_REQUEST);
            assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR");
        }

        let orders = h
            .store
            .list_orders(OrderFilter::default(), PageRequest::default().resolve(10, 50))
            .await
            .unwrap();
        assert_eq!(orders.pagination.total, 0);
    }

    #[tokio::test]
    async fn test_total_beyond_storable_amount_is_rejected() {
        let h = harness().await;
        let banquet = h.product("Banquete", "99999999.99", true).await;
        let customer_id = h.customer("rosa@example.pe").await;

        let response = h
            .server
            .post("/cart/validate")
            .json(&json!({ "items": [{ "product_id": banquet.id, "quantity": 2 }] }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["code"], "VALIDATION_ERROR");

        h.server
            .post("/orders")
            .json(&json!({
                "customer_id": customer_id,
                "items": [{ "product_id": banquet.id, "quantity": 2 }],
            }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_largest_order_can_be_paid() {
        let h = harness().await;
        let product = h.product("Pachamanca", "45.00", true).await;
        let customer_id = h.customer("rosa@example.pe").await;

        let order = h
            .order(
                customer_id,
                json!([{ "product_id": product.id, "quantity": MAX_LINE_QUANTITY }]),
            )
            .await;
        assert_eq!(order["total"], "4455.00");

        h.pay(order["id"].as_i64().unwrap()).await.assert_status_ok();
        assert_eq!(h.gateway.requests()[0].amount_minor, 445_500);
    }

    #[tokio::test]
    async fn test_order_is_readable_with_lines() {
        let h = harness().await;
        let ceviche = h.product("Ceviche", "32.00", true).await;
        let chicha = h.product("Chicha morada", "7.50", true).await;
        let customer_id = h.customer("rosa@example.pe").await;

        let created = h
            .order(
                customer_id,
                json!([
                    { "product_id": ceviche.id, "quantity": 1 },
                    { "product_id": chicha.id, "quantity": 2 },
                ]),
            )
            .await;
        let id = created["id"].as_i64().unwrap();

        let response = h.server.get(&format!("/orders/{id}")).await;
        response.assert_status_ok();
        let order: Order = response.json();
        assert_eq!(order.total, "47.00".parse::<Decimal>().unwrap());
        assert_eq!(order.lines.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_cart_is_rejected() {
        let h = harness().await;
        let customer_id = h.customer("rosa@example.pe").await;

        let response = h
            .server
            .post("/orders")
            .json(&json!({ "customer_id": customer_id, "items": [] }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_non_positive_quantity_is_rejected() {
        let h = harness().await;
        let product = h.product("Ceviche", "32.00", true).await;
        let customer_id = h.customer("rosa@example.pe").await;

        let response = h
            .server
            .post("/orders")
            .json(&json!({
                "customer_id": customer_id,
                "items": [{ "product_id": product.id, "quantity": 0 }],
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_customer_is_not_found() {
        let h = harness().await;
        let product = h.product("Ceviche", "32.00", true).await;

        let response = h
            .server
            .post("/orders")
            .json(&json!({
                "customer_id": 4242,
                "items": [{ "product_id": product.id, "quantity": 1 }],
            }))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unavailable_product_persists_nothing() {
        let h = harness().await;
        let ceviche = h.product("Ceviche", "32.00", true).await;
        let sold_out = h.product("Arroz con pato", "38.00", false).await;
        let customer_id = h.customer("rosa@example.pe").await;

        let response = h
            .server
            .post("/orders")
            .json(&json!({
                "customer_id": customer_id,
                "items": [
                    { "product_id": ceviche.id, "quantity": 1 },
                    { "product_id": sold_out.id, "quantity": 1 },
                ],
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["details"]["products"][0], "Arroz con pato");

        let orders = h
            .store
            .list_orders(Default::default(), PageRequest::default().resolve(12, 50))
            .await
            .unwrap();
        assert_eq!(orders.pagination.total, 0);
    }

    #[tokio::test]
    async fn test_transfer_requires_reference() {
        let h = harness().await;
        let product = h.product("Ceviche", "32.00", true).await;
        let customer_id = h.customer("rosa@example.pe").await;

        let response = h
            .server
            .post("/orders")
            .json(&json!({
                "customer_id": customer_id,
                "items": [{ "product_id": product.id, "quantity": 1 }],
                "payment_method": "transfer",
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = h
            .server
            .post("/orders")
            .json(&json!({
                "customer_id": customer_id,
                "items": [{ "product_id": product.id, "quantity": 1 }],
                "payment_method": "transfer",
                "transfer_reference": "OP-778812",
                "notes": "sin cebolla",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let order: Order = response.json();
        let notes = order.notes.unwrap();
        assert!(notes.starts_with("[TRANSFERENCIA]"));
        assert!(notes.contains("OP-778812"));
        assert!(notes.ends_with("sin cebolla"));
    }

    #[tokio::test]
    async fn test_cart_validation_prices_without_persisting() {
        let h = harness().await;
        let product = h.product("Causa limeña", "18.00", true).await;

        let response = h
            .server
            .post("/cart/validate")
            .json(&json!({ "items": [{ "product_id": product.id, "quantity": 3 }] }))
            .await;
        response.assert_status_ok();
        let cart: PricedCart = response.json();
        assert_eq!(cart.total, "54.00".parse::<Decimal>().unwrap());
        assert_eq!(cart.lines[0].name, "Causa limeña");

        let response = h
            .server
            .post("/cart/validate")
            .json(&json!({ "items": [{ "product_id": 999, "quantity": 1 }] }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

// =============================================================================
// Payment Flow Tests
// =============================================================================

mod payment_flow_tests {
    use super::*;

    #[tokio::test]
    async fn test_successful_charge_confirms_order() {
        let h = harness().await;
        let lomo = h.product("Lomo saltado", "32.00", true).await;
        let chicha = h.product("Chicha morada", "3.50", true).await;
        let customer_id = h.customer("rosa@example.pe").await;
        let order = h
            .order(
                customer_id,
                json!([
                    { "product_id": lomo.id, "quantity": 1 },
                    { "product_id": chicha.id, "quantity": 1 },
                ]),
            )
            .await;
        let order_id = order["id"].as_i64().unwrap();
        assert_eq!(order["total"], "35.50");

        let response = h.pay(order_id).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "completado");
        assert_eq!(body["payment"]["status"], "completado");
        assert_eq!(body["order"]["status"], "confirmado");

        let requests = h.gateway.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].amount_minor, 3550);
        assert_eq!(requests[0].currency, "PEN");

        let response = h.server.get(&format!("/orders/{order_id}")).await;
        let order: Order = response.json();
        assert_eq!(order.status, OrderStatus::Confirmado);
    }

    #[tokio::test]
    async fn test_payment_history() {
        let h = harness().await;
        let product = h.product("Ceviche", "32.00", true).await;
        let customer_id = h.customer("rosa@example.pe").await;
        let order_id = h
            .order(customer_id, json!([{ "product_id": product.id, "quantity": 1 }]))
            .await["id"]
            .as_i64()
            .unwrap();

        h.server
            .get(&format!("/payments/{order_id}"))
            .await
            .assert_status(StatusCode::NOT_FOUND);

        h.pay(order_id).await.assert_status_ok();

        let response = h.server.get(&format!("/payments/{order_id}")).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["attempts"].as_array().unwrap().len(), 1);
        assert_eq!(body["completed"]["status"], "completado");
    }
}

// =============================================================================
// Admin Session Tests
// =============================================================================

mod admin_session_tests {
    use super::*;

    #[tokio::test]
    async fn test_login_and_profile() {
        let h = harness().await;
        let token = h.admin_token().await;

        let response = h.server.get("/admin/me").authorization_bearer(&token).await;
        response.assert_status_ok();
        let profile: AdminProfile = response.json();
        assert_eq!(profile.email, ADMIN_EMAIL);
        assert_eq!(profile.role, AdminRole::Cocinero);
    }

    #[tokio::test]
    async fn test_bad_password_is_unauthorized() {
        let h = harness().await;
        let response = h
            .server
            .post("/admin/login")
            .json(&json!({ "email": ADMIN_EMAIL, "password": "Equivocada1" }))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        let body: Value = response.json();
        assert!(body.get("token").is_none());
    }

    #[tokio::test]
    async fn test_deactivated_admin_gets_no_credential() {
        let h = harness().await;
        h.store
            .create_admin(NewAdmin {
                name: "Ex".to_string(),
                email: "ex@comanda.pe".to_string(),
                password_hash: hash_password("Cocina2024").unwrap(),
                role: AdminRole::Gerente,
                active: false,
            })
            .await
            .unwrap();

        let response = h
            .server
            .post("/admin/login")
            .json(&json!({ "email": "ex@comanda.pe", "password": "Cocina2024" }))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
        let body: Value = response.json();
        assert_eq!(body["code"], "FORBIDDEN");
        assert!(body.get("token").is_none());
    }

    #[tokio::test]
    async fn test_admin_routes_require_credential() {
        let h = harness().await;
        h.server.get("/admin/me").await.assert_status(StatusCode::UNAUTHORIZED);
        h.server.get("/orders").await.assert_status(StatusCode::UNAUTHORIZED);
        h.server
            .get("/admin/me")
            .authorization_bearer("v1.bm9wZQ.bm9wZQ")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_change_password() {
        let h = harness().await;
        let token = h.admin_token().await;

        h.server
            .post("/admin/password")
            .authorization_bearer(&token)
            .json(&json!({ "current_password": "Cocina2024", "new_password": "debil" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);

        h.server
            .post("/admin/password")
            .authorization_bearer(&token)
            .json(&json!({ "current_password": "Cocina2024", "new_password": "Segura2025" }))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        h.server
            .post("/admin/login")
            .json(&json!({ "email": ADMIN_EMAIL, "password": "Segura2025" }))
            .await
            .assert_status_ok();
    }
}

// =============================================================================
// Status Transition Tests
// =============================================================================

mod status_tests {
    use super::*;

    async fn paid_order(h: &common::Harness) -> i64 {
        let product = h.product("Ceviche", "32.00", true).await;
        let customer_id = h.customer("rosa@example.pe").await;
        let order_id = h
            .order(customer_id, json!([{ "product_id": product.id, "quantity": 1 }]))
            .await["id"]
            .as_i64()
            .unwrap();
        h.pay(order_id).await.assert_status_ok();
        order_id
    }

    #[tokio::test]
    async fn test_pendiente_cannot_jump_to_listo() {
        let h = harness().await;
        let product = h.product("Ceviche", "32.00", true).await;
        let customer_id = h.customer("rosa@example.pe").await;
        let order_id = h
            .order(customer_id, json!([{ "product_id": product.id, "quantity": 1 }]))
            .await["id"]
            .as_i64()
            .unwrap();
        let token = h.admin_token().await;

        let response = h.set_status(&token, order_id, "listo").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["code"], "INVALID_STATUS_TRANSITION");

        let order: Order = h.server.get(&format!("/orders/{order_id}")).await.json();
        assert_eq!(order.status, OrderStatus::Pendiente);
    }

    #[tokio::test]
    async fn test_kitchen_walks_order_forward() {
        let h = harness().await;
        let order_id = paid_order(&h).await;
        let token = h.admin_token().await;

        let response = h.set_status(&token, order_id, "preparando").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "preparando");

        let response = h.set_status(&token, order_id, "entregado").await;
        response.assert_status_ok();
        assert_eq!(response.json::<Value>()["status"], "listo");

        h.set_status(&token, order_id, "cancelado")
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_status_value() {
        let h = harness().await;
        let order_id = paid_order(&h).await;
        let token = h.admin_token().await;

        let response = h.set_status(&token, order_id, "servido").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["code"], "INVALID_ORDER_STATUS");
    }

    #[tokio::test]
    async fn test_status_change_requires_credential() {
        let h = harness().await;
        let order_id = paid_order(&h).await;

        h.server
            .put(&format!("/orders/{order_id}/status"))
            .json(&json!({ "status": "preparando" }))
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_dashboard_lists_by_status() {
        let h = harness().await;
        let order_id = paid_order(&h).await;
        let token = h.admin_token().await;

        let response = h
            .server
            .get("/orders")
            .add_query_param("status", "confirmado")
            .authorization_bearer(&token)
            .await;
        response.assert_status_ok();
        let page: Paginated<Order> = response.json();
        assert_eq!(page.pagination.total, 1);
        assert_eq!(page.data[0].id, order_id);

        let response = h
            .server
            .get("/orders")
            .add_query_param("status", "pendiente")
            .authorization_bearer(&token)
            .await;
        assert_eq!(response.json::<Paginated<Order>>().pagination.total, 0);
    }
}
