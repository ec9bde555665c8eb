//! Fluent assembly of the ordering server

use super::exposure::RestExposure;
use super::host::ServerHost;
use crate::config::AppConfig;
use crate::core::service::Store;
use crate::gateway::PaymentGateway;
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Builder for creating the HTTP server
///
/// # Example
///
/// ```ignore
/// let app = ServerBuilder::new()
///     .with_config(config)
///     .with_store(InMemoryStore::new())
///     .with_gateway(ScriptedGateway::approving())
///     .build()?;
/// ```
pub struct ServerBuilder {
    config: Option<AppConfig>,
    store: Option<Arc<dyn Store>>,
    gateway: Option<Arc<dyn PaymentGateway>>,
    custom_routes: Vec<Router>,
}

impl ServerBuilder {
    /// Empty builder; config, store and gateway must be supplied
    pub fn new() -> Self {
        Self {
            config: None,
            store: None,
            gateway: None,
            custom_routes: Vec::new(),
        }
    }

    /// Set the configuration (required)
    pub fn with_config(mut self, config: AppConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the store (required)
    pub fn with_store(self, store: impl Store + 'static) -> Self {
        self.with_shared_store(Arc::new(store))
    }

    /// Set a store that is also used outside the server
    pub fn with_shared_store(mut self, store: Arc<dyn Store>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the payment gateway (required)
    pub fn with_gateway(self, gateway: impl PaymentGateway + 'static) -> Self {
        self.with_shared_gateway(Arc::new(gateway))
    }

    /// Set a gateway that is also used outside the server
    pub fn with_shared_gateway(mut self, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Merge extra routes (e.g. static storefront assets) into the app
    pub fn with_custom_routes(mut self, routes: Router) -> Self {
        self.custom_routes.push(routes);
        self
    }

    /// Wire the services together
    ///
    /// Fails when a required component is missing or the configuration
    /// does not validate.
    pub fn build_host(&mut self) -> Result<ServerHost> {
        let config = self
            .config
            .take()
            .ok_or_else(|| anyhow::anyhow!("AppConfig is required. Call .with_config()"))?;
        config.validate()?;

        let store = self
            .store
            .take()
            .ok_or_else(|| anyhow::anyhow!("Store is required. Call .with_store()"))?;

        let gateway = self
            .gateway
            .take()
            .ok_or_else(|| anyhow::anyhow!("PaymentGateway is required. Call .with_gateway()"))?;

        Ok(ServerHost::new(config, store, gateway))
    }

    /// Router with health, API and custom routes
    pub fn build(mut self) -> Result<Router> {
        let host = Arc::new(self.build_host()?);
        let custom_routes = std::mem::take(&mut self.custom_routes);
        RestExposure::build_router(host, custom_routes)
    }

    /// Bind `addr` and serve until SIGTERM or Ctrl+C
    pub async fn serve(self, addr: &str) -> Result<()> {
        let app = self.build()?;
        let listener = TcpListener::bind(addr).await?;

        tracing::info!(%addr, "comanda listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("comanda stopped");
        Ok(())
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, draining connections");
        },
        _ = terminate => {
            tracing::info!("SIGTERM received, draining connections");
        },
    }
}
