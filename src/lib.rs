//! # comanda
//!
//! Online ordering backend for a restaurant.
//!
//! ## Features
//!
//! - **Server-side pricing**: carts are priced from the catalog, never from the client
//! - **Atomic orders**: an order and its lines are persisted together or not at all
//! - **Single settlement**: at most one completed card payment per order, even under
//!   concurrent attempts
//! - **Order lifecycle**: `pendiente → confirmado → preparando → listo`, with
//!   cancellation from any non-terminal state
//! - **Admin sessions**: signed, expiring credentials for the kitchen back office
//! - **Pluggable storage**: in-memory or PostgreSQL behind the same traits
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use comanda::prelude::*;
//!
//! let app = ServerBuilder::new()
//!     .with_config(AppConfig::from_yaml_file("comanda.yaml")?)
//!     .with_store(InMemoryStore::new())
//!     .with_gateway(ScriptedGateway::approving())
//!     .build()?;
//! ```

pub mod auth;
pub mod config;
pub mod core;
pub mod gateway;
pub mod orders;
pub mod payments;
pub mod reports;
pub mod server;
pub mod storage;

/// Re-exports of commonly used types and traits
pub mod prelude {
    // === Domain ===
    pub use crate::core::{
        AdminAccount, AdminProfile, AdminRole, Category, ComandaError, ComandaResult, Customer,
        NewCustomer, NewProduct, Order, OrderFilter, OrderLine, OrderStatus, PageRequest, Paginated, Payment,
        PaymentMethod, PaymentStatus, PricedCart, Product, ProductFilter, ProductUpdate,
        error::{EntityError, PaymentError, RequestError, ValidationError},
    };

    // === Storage traits ===
    pub use crate::core::service::{
        AdminService, CatalogService, CustomerService, NewAdmin, OrderService, PaymentService,
        StatusUpdate, Store,
    };

    // === Services ===
    pub use crate::auth::{AdminAuthService, SessionGuard};
    pub use crate::orders::{CartItem, MAX_LINE_QUANTITY, OrderBuilder, PlaceOrder, StatusService};
    pub use crate::payments::{PayOrder, PaymentCoordinator, PaymentReceipt};

    // === Gateway ===
    pub use crate::gateway::{
        ChargeOutcome, ChargeRequest, CulqiGateway, GatewayError, PaymentGateway, Script,
        ScriptedGateway,
    };

    // === Storage ===
    pub use crate::storage::InMemoryStore;
    #[cfg(feature = "postgres")]
    pub use crate::storage::PostgresStore;

    // === Config ===
    pub use crate::config::AppConfig;

    // === Server ===
    pub use crate::server::{AdminSession, AppState, ServerBuilder, ServerHost};

    // === External dependencies ===
    pub use anyhow::Result;
    pub use async_trait::async_trait;
    pub use chrono::{DateTime, Utc};
    pub use rust_decimal::Decimal;
    pub use serde::{Deserialize, Serialize};
}
