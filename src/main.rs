//! comanda-server: the ordering backend binary
//!
//! Configuration comes from the YAML file named by `COMANDA_CONFIG`
//! (default `comanda.yaml`, skipped when absent) and the environment.

use anyhow::{Context, Result};
use comanda::auth::{AdminAuthService, SessionGuard};
use comanda::config::{AppConfig, StoreBackend};
use comanda::core::admin::AdminRole;
use comanda::core::catalog::NewProduct;
use comanda::core::service::{CatalogService, Store};
use comanda::gateway::{CulqiGateway, PaymentGateway, ScriptedGateway};
use comanda::server::ServerBuilder;
use comanda::storage::InMemoryStore;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_CONFIG_PATH: &str = "comanda.yaml";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("comanda=info,tower_http=info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_config() -> Result<AppConfig> {
    let path = std::env::var("COMANDA_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut config = if std::path::Path::new(&path).exists() {
        tracing::info!(path = %path, "loading configuration");
        AppConfig::from_yaml_file(&path)?
    } else {
        tracing::info!(path = %path, "no configuration file, using defaults");
        AppConfig::default()
    };
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

async fn open_store(config: &AppConfig) -> Result<Arc<dyn Store>> {
    match config.store.backend {
        StoreBackend::Memory => {
            let store = InMemoryStore::new();
            seed_demo_menu(&store).await?;
            tracing::warn!("using the in-memory store; data is lost on restart");
            Ok(Arc::new(store))
        }
        #[cfg(feature = "postgres")]
        StoreBackend::Postgres => {
            let url = config
                .store
                .database_url
                .as_deref()
                .context("store.database_url is required for the postgres backend")?;
            let store =
                comanda::storage::PostgresStore::connect(url, config.store.max_connections).await?;
            comanda::storage::postgres::ensure_schema(store.pool()).await?;
            tracing::info!("connected to PostgreSQL");
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "postgres"))]
        StoreBackend::Postgres => {
            anyhow::bail!("the postgres backend requires building with the `postgres` feature")
        }
    }
}

fn open_gateway(config: &AppConfig) -> Result<Arc<dyn PaymentGateway>> {
    if config.gateway.simulate {
        tracing::warn!("gateway.simulate is enabled; card payments are approved without charging");
        return Ok(Arc::new(ScriptedGateway::approving()));
    }
    let gateway = CulqiGateway::new(
        config.gateway.api_url.clone(),
        config.gateway.secret_key.clone(),
        config.gateway.timeout_secs,
    )?;
    Ok(Arc::new(gateway))
}

/// Create the first admin from `COMANDA_ADMIN_EMAIL` / `COMANDA_ADMIN_PASSWORD`
async fn bootstrap_admin(config: &AppConfig, store: Arc<dyn Store>) -> Result<()> {
    let (Ok(email), Ok(password)) = (
        std::env::var("COMANDA_ADMIN_EMAIL"),
        std::env::var("COMANDA_ADMIN_PASSWORD"),
    ) else {
        return Ok(());
    };
    let auth = AdminAuthService::new(
        store,
        SessionGuard::new(
            config.auth.session_secret.as_bytes(),
            chrono::Duration::hours(config.auth.session_ttl_hours),
        ),
        config.auth.min_password_len,
    );
    auth.ensure_admin("Administrador", &email, &password, AdminRole::Admin)
        .await
        .map_err(|e| anyhow::anyhow!("bootstrap admin: {}", e))?;
    Ok(())
}

async fn seed_demo_menu(store: &InMemoryStore) -> Result<()> {
    let entradas = store
        .create_category("Entradas", Some("Para empezar"))
        .await?;
    let fondos = store.create_category("Fondos", None).await?;
    let bebidas = store.create_category("Bebidas", None).await?;

    let menu = [
        (entradas.id, "Causa limeña", Decimal::new(1800, 2)),
        (entradas.id, "Papa a la huancaína", Decimal::new(1500, 2)),
        (fondos.id, "Lomo saltado", Decimal::new(3200, 2)),
        (fondos.id, "Ají de gallina", Decimal::new(2800, 2)),
        (bebidas.id, "Chicha morada", Decimal::new(700, 2)),
    ];
    for (category_id, name, price) in menu {
        store
            .create_product(NewProduct {
                category_id: Some(category_id),
                name: name.to_string(),
                description: None,
                price,
                available: true,
                image_url: None,
            })
            .await?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = load_config().context("invalid configuration")?;
    let store = open_store(&config).await?;
    bootstrap_admin(&config, store.clone()).await?;
    let gateway = open_gateway(&config)?;
    let bind = config.server.bind.clone();

    ServerBuilder::new()
        .with_config(config)
        .with_shared_store(store)
        .with_shared_gateway(gateway)
        .serve(&bind)
        .await
}
