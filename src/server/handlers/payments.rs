//! Card settlement endpoints

use super::AppState;
use crate::core::error::ComandaResult;
use crate::payments::{PayOrder, PaymentHistory, PaymentReceipt};
use crate::server::extract::{ApiJson, ApiPath};
use axum::Json;
use axum::extract::State;

pub async fn pay_order(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<PayOrder>,
) -> ComandaResult<Json<PaymentReceipt>> {
    Ok(Json(state.payments.pay(payload).await?))
}

pub async fn payment_history(
    State(state): State<AppState>,
    ApiPath(order_id): ApiPath<i64>,
) -> ComandaResult<Json<PaymentHistory>> {
    Ok(Json(state.payments.history(order_id).await?))
}
