//! HTTP server: host, route table, handlers and extractors
//!
//! [`ServerBuilder`] wires a store, a payment gateway and the configuration
//! into a [`ServerHost`], then exposes it as an Axum `Router`.

pub mod builder;
pub mod exposure;
pub mod extract;
pub mod handlers;
pub mod host;
pub mod router;

pub use builder::ServerBuilder;
pub use extract::{AdminSession, ApiJson, ApiPath, ApiQuery};
pub use handlers::AppState;
pub use host::ServerHost;
