//! Configuration file loading

use comanda::config::{AppConfig, StoreBackend};
use comanda::core::error::ConfigError;
use std::io::Write;

const YAML: &str = r#"
server:
  bind: 0.0.0.0:8080
  cors_origins:
    - https://comanda.example.pe
auth:
  session_secret: file-secret-0123456789abcdef0123456789
  session_ttl_hours: 12
gateway:
  api_url: https://gateway.example.pe/v2
  secret_key: sk_test_file
  timeout_secs: 10
store:
  backend: postgres
  database_url: postgres://comanda@localhost/comanda
  max_connections: 4
"#;

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(YAML.as_bytes()).unwrap();

    let config = AppConfig::from_yaml_file(file.path().to_str().unwrap()).unwrap();
    assert_eq!(config.server.bind, "0.0.0.0:8080");
    assert_eq!(config.server.cors_origins, vec!["https://comanda.example.pe"]);
    assert_eq!(config.auth.session_ttl_hours, 12);
    assert_eq!(config.auth.min_password_len, 8);
    assert_eq!(config.gateway.timeout_secs, 10);
    assert_eq!(config.gateway.currency, "PEN");
    assert_eq!(config.store.backend, StoreBackend::Postgres);
    assert_eq!(config.store.max_connections, 4);
    assert!(!config.gateway.simulate);
    assert!(config.validate().is_ok());
}

#[test]
fn test_file_without_gateway_key_is_refused() {
    let yaml = YAML.replace("  secret_key: sk_test_file\n", "");
    let config = AppConfig::from_yaml_str(&yaml).unwrap();
    match config.validate() {
        Err(ConfigError::InvalidValue { field, .. }) => assert_eq!(field, "gateway.secret_key"),
        other => panic!("expected invalid gateway key, got {other:?}"),
    }
}

#[test]
fn test_missing_file_names_the_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.yaml");
    let path = path.to_str().unwrap();

    match AppConfig::from_yaml_file(path) {
        Err(ConfigError::ParseError { file, .. }) => assert_eq!(file.as_deref(), Some(path)),
        other => panic!("expected parse error, got {other:?}"),
    }
}

#[test]
fn test_unknown_backend_is_rejected() {
    let result = AppConfig::from_yaml_str("store:\n  backend: sqlite\n");
    assert!(matches!(result, Err(ConfigError::ParseError { file: None, .. })));
}

#[test]
fn test_env_overrides_win_over_file() {
    let mut config = AppConfig::from_yaml_str(YAML).unwrap();
    config.apply_overrides(|key| match key {
        "CULQI_SECRET_KEY" => Some("sk_live_override".to_string()),
        "COMANDA_BIND" => Some("127.0.0.1:9000".to_string()),
        _ => None,
    });
    assert_eq!(config.gateway.secret_key, "sk_live_override");
    assert_eq!(config.server.bind, "127.0.0.1:9000");
    assert_eq!(config.gateway.api_url, "https://gateway.example.pe/v2");
}
