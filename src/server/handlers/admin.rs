//! Back-office session, profile and reports

use super::AppState;
use crate::auth::LoginResponse;
use crate::core::admin::AdminProfile;
use crate::core::error::ComandaResult;
use crate::reports::{SalesQuery, SalesReport, sales_report};
use crate::server::extract::{AdminSession, ApiJson, ApiQuery};
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> ComandaResult<Json<LoginResponse>> {
    let response = state
        .auth
        .authenticate(&payload.email, &payload.password)
        .await?;
    Ok(Json(response))
}

pub async fn me(session: AdminSession) -> Json<AdminProfile> {
    Json(AdminProfile::from(&session.admin))
}

pub async fn change_password(
    session: AdminSession,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<ChangePasswordRequest>,
) -> ComandaResult<StatusCode> {
    state
        .auth
        .change_password(
            session.admin_id(),
            &payload.current_password,
            &payload.new_password,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn sales(
    _session: AdminSession,
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SalesQuery>,
) -> ComandaResult<Json<SalesReport>> {
    Ok(Json(sales_report(state.store.as_ref(), query).await?))
}
