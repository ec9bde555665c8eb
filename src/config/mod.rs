//! Configuration loading and management

use crate::core::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Shortest accepted session signing secret, in bytes
pub const MIN_SECRET_LEN: usize = 32;

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind (e.g., "0.0.0.0:3000")
    pub bind: String,

    /// Origins allowed by CORS; empty allows any origin
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            cors_origins: Vec::new(),
        }
    }
}

/// Admin credential settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub min_password_len: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_secret: String::new(),
            session_ttl_hours: 24,
            min_password_len: 8,
        }
    }
}

/// Card processor settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub api_url: String,
    /// Required unless `simulate` is set
    pub secret_key: String,
    pub currency: String,
    pub timeout_secs: u64,
    /// Approve every charge in-process instead of calling the processor.
    /// Only accepted with the memory backend.
    pub simulate: bool,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.culqi.com/v2".to_string(),
            secret_key: String::new(),
            currency: "PEN".to_string(),
            timeout_secs: 15,
            simulate: false,
        }
    }
}

/// Which store backs the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub database_url: Option<String>,
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            database_url: None,
            max_connections: 10,
        }
    }
}

/// Catalog listing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub page_size_default: usize,
    pub page_size_max: usize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            page_size_default: 12,
            page_size_max: 50,
        }
    }
}

/// Complete service configuration
///
/// # Example
///
/// ```yaml
/// server:
///   bind: 0.0.0.0:3000
///   cors_origins: [https://comanda.example.pe]
/// auth:
///   session_secret: change-me-to-a-long-random-string-please
/// gateway:
///   api_url: https://api.culqi.com/v2
///   secret_key: sk_live_replace_me
///   timeout_secs: 15
/// store:
///   backend: postgres
///   database_url: postgres://comanda@localhost/comanda
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub gateway: GatewayConfig,
    pub store: StoreConfig,
    pub catalog: CatalogConfig,
}

impl AppConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ParseError {
            file: Some(path.to_string()),
            message: e.to_string(),
        })?;
        serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError {
            file: Some(path.to_string()),
            message: e.to_string(),
        })
    }

    /// Load configuration from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(yaml).map_err(|e| ConfigError::ParseError {
            file: None,
            message: e.to_string(),
        })
    }

    /// Override secrets and URLs from the process environment
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Same as [`apply_env_overrides`](Self::apply_env_overrides) with an injectable lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(bind) = get("COMANDA_BIND") {
            self.server.bind = bind;
        }
        if let Some(url) = get("COMANDA_DATABASE_URL") {
            self.store.database_url = Some(url);
            self.store.backend = StoreBackend::Postgres;
        }
        if let Some(secret) = get("COMANDA_SESSION_SECRET") {
            self.auth.session_secret = secret;
        }
        if let Some(url) = get("CULQI_API_URL") {
            self.gateway.api_url = url;
        }
        if let Some(key) = get("CULQI_SECRET_KEY") {
            self.gateway.secret_key = key;
        }
        if let Some(flag) = get("COMANDA_GATEWAY_SIMULATE") {
            self.gateway.simulate = matches!(flag.trim(), "1" | "true" | "yes");
        }
    }

    /// Reject configurations the service cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.session_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::InvalidValue {
                field: "auth.session_secret".to_string(),
                message: format!("must be at least {MIN_SECRET_LEN} bytes"),
            });
        }
        if self.auth.session_ttl_hours <= 0 {
            return Err(ConfigError::InvalidValue {
                field: "auth.session_ttl_hours".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.gateway.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "gateway.timeout_secs".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if !self.gateway.simulate && self.gateway.secret_key.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "gateway.secret_key".to_string(),
                message: "required unless gateway.simulate is enabled".to_string(),
            });
        }
        if self.gateway.simulate && self.store.backend == StoreBackend::Postgres {
            return Err(ConfigError::InvalidValue {
                field: "gateway.simulate".to_string(),
                message: "not allowed with the postgres backend".to_string(),
            });
        }
        if self.gateway.currency.len() != 3 {
            return Err(ConfigError::InvalidValue {
                field: "gateway.currency".to_string(),
                message: "must be an ISO 4217 code".to_string(),
            });
        }
        if self.store.backend == StoreBackend::Postgres
            && self
                .store
                .database_url
                .as_deref()
                .is_none_or(|u| u.trim().is_empty())
        {
            return Err(ConfigError::InvalidValue {
                field: "store.database_url".to_string(),
                message: "required for the postgres backend".to_string(),
            });
        }
        if self.catalog.page_size_default == 0
            || self.catalog.page_size_default > self.catalog.page_size_max
        {
            return Err(ConfigError::InvalidValue {
                field: "catalog.page_size_default".to_string(),
                message: "must be between 1 and page_size_max".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn simulated() -> AppConfig {
        let mut config = AppConfig::default();
        config.auth.session_secret = SECRET.to_string();
        config.gateway.simulate = true;
        config
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config.auth.session_ttl_hours, 24);
        assert_eq!(config.auth.min_password_len, 8);
        assert_eq!(config.gateway.currency, "PEN");
        assert_eq!(config.gateway.timeout_secs, 15);
        assert!(!config.gateway.simulate);
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.catalog.page_size_default, 12);
        assert_eq!(config.catalog.page_size_max, 50);
    }

    #[test]
    fn test_partial_sections() {
        let yaml = format!(
            "auth:\n  session_secret: {SECRET}\ngateway:\n  secret_key: sk_test_1\n  timeout_secs: 5\n"
        );
        let config = AppConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(config.gateway.timeout_secs, 5);
        assert_eq!(config.gateway.currency, "PEN");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_short_secret() {
        let err = AppConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("auth.session_secret"));
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let mut config = simulated();
        config.gateway.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_gateway_key_requires_simulation() {
        let mut config = simulated();
        config.gateway.simulate = false;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("gateway.secret_key"), "{err}");

        config.gateway.secret_key = "   ".to_string();
        assert!(config.validate().is_err());

        config.gateway.secret_key = "sk_test_123".to_string();
        assert!(config.validate().is_ok());

        config.gateway.secret_key.clear();
        config.gateway.simulate = true;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_simulation_refused_with_postgres() {
        let mut config = simulated();
        config.store.backend = StoreBackend::Postgres;
        config.store.database_url = Some("postgres://localhost/comanda".into());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("gateway.simulate"), "{err}");
    }

    #[test]
    fn test_postgres_requires_url() {
        let mut config = AppConfig::default();
        config.auth.session_secret = SECRET.to_string();
        config.gateway.secret_key = "sk_test_123".to_string();
        config.store.backend = StoreBackend::Postgres;
        assert!(config.validate().is_err());
        config.store.database_url = Some("postgres://localhost/comanda".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = [
            ("COMANDA_BIND", "0.0.0.0:8080"),
            ("COMANDA_DATABASE_URL", "postgres://db/comanda"),
            ("CULQI_SECRET_KEY", "sk_test_123"),
            ("COMANDA_SESSION_SECRET", ""),
            ("COMANDA_GATEWAY_SIMULATE", "true"),
        ]
        .into_iter()
        .collect();

        let mut config = AppConfig::default();
        config.auth.session_secret = SECRET.to_string();
        config.apply_overrides(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.server.bind, "0.0.0.0:8080");
        assert_eq!(config.store.backend, StoreBackend::Postgres);
        assert_eq!(config.gateway.secret_key, "sk_test_123");
        assert!(config.gateway.simulate);
        // blank values do not override
        assert_eq!(config.auth.session_secret, SECRET);
    }

    #[test]
    fn test_parse_error_is_config_error() {
        assert!(matches!(
            AppConfig::from_yaml_str("server: [unclosed"),
            Err(ConfigError::ParseError { .. })
        ));
    }
}
