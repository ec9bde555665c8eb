//! Server host for transport-agnostic API exposure
//!
//! The host owns every domain service the HTTP layer dispatches to. It is
//! built once by the [`ServerBuilder`](super::ServerBuilder) and shared
//! behind an `Arc` as the router state.

use crate::auth::{AdminAuthService, SessionGuard};
use crate::config::AppConfig;
use crate::core::service::Store;
use crate::gateway::PaymentGateway;
use crate::orders::{OrderBuilder, StatusService};
use crate::payments::PaymentCoordinator;
use std::sync::Arc;
use std::time::Duration;

/// Host context containing all service state
pub struct ServerHost {
    /// Validated configuration
    pub config: Arc<AppConfig>,

    /// Persistent store shared by every service
    pub store: Arc<dyn Store>,

    /// Cart pricing and order creation
    pub orders: OrderBuilder,

    /// Staff-driven status transitions
    pub status: StatusService,

    /// Card settlement
    pub payments: PaymentCoordinator,

    /// Admin login and credential checks
    pub auth: AdminAuthService,
}

impl ServerHost {
    /// Wire the services around one store and one gateway
    pub fn new(config: AppConfig, store: Arc<dyn Store>, gateway: Arc<dyn PaymentGateway>) -> Self {
        let guard = SessionGuard::new(
            config.auth.session_secret.as_bytes(),
            chrono::Duration::hours(config.auth.session_ttl_hours),
        );

        Self {
            orders: OrderBuilder::new(store.clone()),
            status: StatusService::new(store.clone()),
            payments: PaymentCoordinator::new(
                store.clone(),
                gateway,
                config.gateway.currency.clone(),
                Duration::from_secs(config.gateway.timeout_secs),
            ),
            auth: AdminAuthService::new(store.clone(), guard, config.auth.min_password_len),
            store,
            config: Arc::new(config),
        }
    }

    /// Page size bounds for listings
    pub fn page_bounds(&self) -> (usize, usize) {
        (
            self.config.catalog.page_size_default,
            self.config.catalog.page_size_max,
        )
    }
}
