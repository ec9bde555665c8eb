//! Categories, products and cart pricing

use super::AppState;
use crate::core::catalog::{Category, NewProduct, Product, ProductFilter, ProductUpdate};
use crate::core::error::{ComandaResult, EntityError, ValidationError};
use crate::core::money::{CURRENCY_SCALE, max_amount};
use crate::core::order::PricedCart;
use crate::core::query::{PageRequest, Paginated};
use crate::orders::CartItem;
use crate::server::extract::{AdminSession, ApiJson, ApiPath, ApiQuery};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde::Deserialize;
use validator::Validate;

/// `GET /products` query string
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    pub category_id: Option<i64>,
    pub available: Option<bool>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

/// `POST /cart/validate` body
#[derive(Debug, Deserialize)]
pub struct CartRequest {
    pub items: Vec<CartItem>,
}

pub async fn list_categories(State(state): State<AppState>) -> ComandaResult<Json<Vec<Category>>> {
    Ok(Json(state.store.list_categories().await?))
}

pub async fn get_category(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ComandaResult<Json<Category>> {
    let category = state
        .store
        .get_category(id)
        .await?
        .ok_or_else(|| EntityError::not_found("category", id))?;
    Ok(Json(category))
}

pub async fn list_products(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<ProductListQuery>,
) -> ComandaResult<Json<Paginated<Product>>> {
    let (default_limit, max_limit) = state.page_bounds();
    let page = PageRequest {
        page: query.page,
        limit: query.limit,
    }
    .resolve(default_limit, max_limit);
    let filter = ProductFilter {
        category_id: query.category_id,
        available: query.available,
    };
    Ok(Json(state.store.list_products(filter, page).await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ComandaResult<Json<Product>> {
    let product = state
        .store
        .get_product(id)
        .await?
        .ok_or_else(|| EntityError::not_found("product", id))?;
    Ok(Json(product))
}

fn check_price(price: Decimal) -> Result<(), ValidationError> {
    if price <= Decimal::ZERO {
        return Err(ValidationError::field("price", "price must be greater than zero"));
    }
    if price > max_amount() || price.scale() > CURRENCY_SCALE {
        return Err(ValidationError::field(
            "price",
            format!("price must be at most {} with two decimals", max_amount()),
        ));
    }
    Ok(())
}

async fn check_category(state: &AppState, category_id: Option<i64>) -> ComandaResult<()> {
    let Some(id) = category_id else {
        return Ok(());
    };
    if state.store.get_category(id).await?.is_none() {
        return Err(ValidationError::field("category_id", format!("category {id} does not exist")).into());
    }
    Ok(())
}

pub async fn create_product(
    session: AdminSession,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewProduct>,
) -> ComandaResult<(StatusCode, Json<Product>)> {
    payload.validate()?;
    check_price(payload.price)?;
    check_category(&state, payload.category_id).await?;

    let product = state.store.create_product(payload).await?;
    tracing::info!(
        product_id = product.id,
        admin_id = session.admin_id(),
        "product created"
    );
    Ok((StatusCode::CREATED, Json(product)))
}

/// Products are never deleted; withdrawing a dish sets `available: false`
pub async fn update_product(
    session: AdminSession,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<ProductUpdate>,
) -> ComandaResult<Json<Product>> {
    payload.validate()?;
    if let Some(price) = payload.price {
        check_price(price)?;
    }
    check_category(&state, payload.category_id).await?;

    let product = state
        .store
        .update_product(id, payload)
        .await?
        .ok_or_else(|| EntityError::not_found("product", id))?;
    tracing::info!(
        product_id = id,
        admin_id = session.admin_id(),
        available = product.available,
        "product updated"
    );
    Ok(Json(product))
}

/// Price a cart without creating an order
pub async fn validate_cart(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CartRequest>,
) -> ComandaResult<Json<PricedCart>> {
    Ok(Json(state.orders.price_cart(&payload.items).await?))
}
