//! Customer registration and lookups

use super::{AppState, parse_status};
use crate::core::customer::{Customer, NewCustomer};
use crate::core::error::{ComandaResult, EntityError};
use crate::core::order::{Order, OrderFilter};
use crate::core::query::{PageRequest, Paginated};
use crate::server::extract::{ApiJson, ApiPath, ApiQuery};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use validator::Validate;

/// `GET /customers/{id}/orders` query string
#[derive(Debug, Default, Deserialize)]
pub struct CustomerOrdersQuery {
    pub status: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

pub async fn register_customer(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewCustomer>,
) -> ComandaResult<(StatusCode, Json<Customer>)> {
    let payload = payload.normalized();
    payload.validate()?;

    let email = payload.email.clone();
    let customer = state
        .store
        .create_customer(payload)
        .await?
        .ok_or_else(|| EntityError::AlreadyExists {
            entity_type: "customer".to_string(),
            key: email,
        })?;

    tracing::info!(customer_id = customer.id, "customer registered");
    Ok((StatusCode::CREATED, Json(customer)))
}

/// Look a customer up by numeric id or by email
pub async fn get_customer(
    State(state): State<AppState>,
    ApiPath(key): ApiPath<String>,
) -> ComandaResult<Json<Customer>> {
    let customer = match key.parse::<i64>() {
        Ok(id) => state.store.get_customer(id).await?,
        Err(_) => {
            state
                .store
                .find_customer_by_email(&key.trim().to_lowercase())
                .await?
        }
    };
    customer
        .map(Json)
        .ok_or_else(|| EntityError::not_found("customer", key).into())
}

/// A customer's orders, newest first
pub async fn customer_orders(
    State(state): State<AppState>,
    ApiPath(customer_id): ApiPath<i64>,
    ApiQuery(query): ApiQuery<CustomerOrdersQuery>,
) -> ComandaResult<Json<Paginated<Order>>> {
    let status = parse_status(query.status.as_deref())?;
    if state.store.get_customer(customer_id).await?.is_none() {
        return Err(EntityError::not_found("customer", customer_id).into());
    }

    let (default_limit, max_limit) = state.page_bounds();
    let page = PageRequest {
        page: query.page,
        limit: query.limit,
    }
    .resolve(default_limit, max_limit);
    let filter = OrderFilter {
        customer_id: Some(customer_id),
        status,
    };
    Ok(Json(state.store.list_orders(filter, page).await?))
}
