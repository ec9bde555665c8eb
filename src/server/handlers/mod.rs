//! HTTP handlers
//!
//! Handlers are thin: they extract, call one service and map the result.
//! Every failure is a [`ComandaError`](crate::core::error::ComandaError)
//! rendered by its `IntoResponse` impl.

pub mod admin;
pub mod catalog;
pub mod customers;
pub mod orders;
pub mod payments;

use super::host::ServerHost;
use crate::core::error::ValidationError;
use crate::core::status::OrderStatus;
use std::sync::Arc;

/// Application state shared across handlers
pub type AppState = Arc<ServerHost>;

/// Parse an optional `status` query value
pub(crate) fn parse_status(value: Option<&str>) -> Result<Option<OrderStatus>, ValidationError> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::parse)
        .transpose()
}
