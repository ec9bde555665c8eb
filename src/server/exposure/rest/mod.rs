//! REST API exposure
//!
//! Consumes a [`ServerHost`] and produces an Axum `Router` with health
//! routes, the API routes, any custom routes, request tracing and CORS.

use super::super::host::ServerHost;
use crate::server::router::build_api_routes;
use anyhow::{Result, anyhow};
use axum::http::HeaderValue;
use axum::{Json, Router, routing::get};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// HTTP/JSON surface of the server
pub struct RestExposure;

impl RestExposure {
    /// Assemble the app router around a host
    pub fn build_router(host: Arc<ServerHost>, custom_routes: Vec<Router>) -> Result<Router> {
        let cors = Self::cors_layer(&host.config.server.cors_origins)?;

        let mut app = Self::health_routes().merge(build_api_routes(host));

        for custom_router in custom_routes {
            app = app.merge(custom_router);
        }

        Ok(app.layer(cors).layer(TraceLayer::new_for_http()))
    }

    /// Any origin when none are configured
    fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
        let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
        if origins.is_empty() {
            return Ok(layer.allow_origin(Any));
        }
        let origins = origins
            .iter()
            .map(|o| {
                HeaderValue::from_str(o).map_err(|e| anyhow!("invalid CORS origin '{}': {}", o, e))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(layer.allow_origin(AllowOrigin::list(origins)))
    }

    /// Liveness checks
    fn health_routes() -> Router {
        Router::new()
            .route("/health", get(Self::health_check))
            .route("/healthz", get(Self::health_check))
    }

    async fn health_check() -> Json<Value> {
        Json(json!({
            "status": "ok",
            "service": "comanda"
        }))
    }
}
