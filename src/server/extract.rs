//! Request extractors that reject with [`ComandaError`]

use super::handlers::AppState;
use crate::core::admin::AdminAccount;
use crate::core::error::{ComandaError, RequestError};
use axum::extract::{FromRequest, FromRequestParts, Path, Query};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

/// JSON body whose parse failures become `VALIDATION_ERROR` responses
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ComandaError))]
pub struct ApiJson<T>(pub T);

/// Query string whose parse failures become `VALIDATION_ERROR` responses
#[derive(Debug, FromRequestParts)]
#[from_request(via(Query), rejection(ComandaError))]
pub struct ApiQuery<T>(pub T);

/// Path parameters whose parse failures become `VALIDATION_ERROR` responses
#[derive(Debug, FromRequestParts)]
#[from_request(via(Path), rejection(ComandaError))]
pub struct ApiPath<T>(pub T);

/// An active admin holding a valid session credential
///
/// Expects `Authorization: Bearer <token>`. A missing, malformed, tampered
/// or expired credential is 401; a deactivated account is 403 even when its
/// credential is still within its lifetime.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub admin: AdminAccount,
}

impl AdminSession {
    pub fn admin_id(&self) -> i64 {
        self.admin.id
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl FromRequestParts<AppState> for AdminSession {
    type Rejection = ComandaError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or_else(|| {
            tracing::warn!(path = %parts.uri.path(), "admin route without credential");
            RequestError::unauthorized("missing credential")
        })?;

        let claims = state.auth.guard().verify(token).inspect_err(|e| {
            tracing::warn!(path = %parts.uri.path(), error = %e, "credential refused");
        })?;

        let admin = state.auth.active_account(claims.sub).await?;
        Ok(Self { admin })
    }
}
