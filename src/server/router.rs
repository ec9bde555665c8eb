//! Route table

use super::handlers::{AppState, admin, catalog, customers, orders, payments};
use axum::Router;
use axum::routing::{get, post, put};

/// Build the storefront and back-office routes
///
/// Storefront:
/// - GET /categories, GET /categories/{id}
/// - GET /products, GET /products/{id}
/// - POST /cart/validate
/// - POST /customers, GET /customers/{id_or_email}, GET /customers/{id}/orders
/// - POST /orders, GET /orders/{id}
/// - POST /payments, GET /payments/{order_id}
///
/// Back office (admin credential):
/// - POST /products, PUT /products/{id}
/// - GET /orders, PUT /orders/{id}/status
/// - POST /admin/login, GET /admin/me, POST /admin/password
/// - GET /admin/reports/sales
pub fn build_api_routes(state: AppState) -> Router {
    Router::new()
        .route("/categories", get(catalog::list_categories))
        .route("/categories/{id}", get(catalog::get_category))
        .route(
            "/products",
            get(catalog::list_products).post(catalog::create_product),
        )
        .route(
            "/products/{id}",
            get(catalog::get_product).put(catalog::update_product),
        )
        .route("/cart/validate", post(catalog::validate_cart))
        .route("/customers", post(customers::register_customer))
        .route("/customers/{id}", get(customers::get_customer))
        .route("/customers/{id}/orders", get(customers::customer_orders))
        .route(
            "/orders",
            get(orders::list_orders).post(orders::place_order),
        )
        .route("/orders/{id}", get(orders::get_order))
        .route("/orders/{id}/status", put(orders::update_status))
        .route("/payments", post(payments::pay_order))
        .route("/payments/{order_id}", get(payments::payment_history))
        .route("/admin/login", post(admin::login))
        .route("/admin/me", get(admin::me))
        .route("/admin/password", post(admin::change_password))
        .route("/admin/reports/sales", get(admin::sales))
        .with_state(state)
}
