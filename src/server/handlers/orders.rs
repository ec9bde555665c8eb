//! Order placement, lookup and the staff status endpoint

use super::{AppState, parse_status};
use crate::core::error::{ComandaResult, EntityError};
use crate::core::order::{Order, OrderFilter};
use crate::core::query::{PageRequest, Paginated};
use crate::core::status::OrderStatus;
use crate::orders::PlaceOrder;
use crate::server::extract::{AdminSession, ApiJson, ApiPath, ApiQuery};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

/// `GET /orders` query string
#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

/// `PUT /orders/{id}/status` body
#[derive(Debug, Deserialize)]
pub struct StatusChange {
    pub status: String,
}

pub async fn place_order(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<PlaceOrder>,
) -> ComandaResult<(StatusCode, Json<Order>)> {
    let order = state.orders.place_order(payload).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn get_order(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
) -> ComandaResult<Json<Order>> {
    let order = state
        .store
        .get_order(id)
        .await?
        .ok_or_else(|| EntityError::not_found("order", id))?;
    Ok(Json(order))
}

/// Staff dashboard listing, newest first
pub async fn list_orders(
    _session: AdminSession,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<OrderListQuery>,
) -> ComandaResult<Json<Paginated<Order>>> {
    let status = parse_status(query.status.as_deref())?;
    let (default_limit, max_limit) = state.page_bounds();
    let page = PageRequest {
        page: query.page,
        limit: query.limit,
    }
    .resolve(default_limit, max_limit);
    let filter = OrderFilter {
        customer_id: None,
        status,
    };
    Ok(Json(state.store.list_orders(filter, page).await?))
}

pub async fn update_status(
    session: AdminSession,
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    ApiJson(payload): ApiJson<StatusChange>,
) -> ComandaResult<Json<Order>> {
    let next: OrderStatus = payload.status.parse()?;
    let order = state.status.advance(id, next, session.admin_id()).await?;
    Ok(Json(order))
}
