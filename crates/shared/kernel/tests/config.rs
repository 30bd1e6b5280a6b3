use keeper_kernel::config::{ConfigError, load_config};
use keeper_kernel::domain::config::ApiConfig;
use serial_test::serial;
use std::fs;
use tempfile::tempdir;

#[test]
#[serial]
fn loads_file_and_keeps_defaults_for_missing_keys() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("server.toml");
    fs::write(&path, "[server]\nport = 8443\n\n[vault]\nsalt = \"pepper\"\n")?;

    let cfg: ApiConfig = load_config(Some(&path))?;
    assert_eq!(cfg.server.port, 8443);
    assert_eq!(cfg.vault.salt.as_deref(), Some("pepper"));
    assert_eq!(cfg.database.url, "mem://");
    Ok(())
}

#[test]
#[serial]
fn format_is_picked_from_extension() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let path = dir.path().join("server.json");
    fs::write(&path, r#"{ "session": { "outbound_capacity": 25 }, "logging": { "json": true } }"#)?;

    let cfg: ApiConfig = load_config(Some(&path))?;
    assert_eq!(cfg.session.outbound_capacity, 25);
    assert!(cfg.logging.json);
    assert_eq!(cfg.session.broadcast_attempts, 3);
    Ok(())
}

#[test]
#[serial]
fn explicit_missing_file_is_an_error() {
    let dir = tempdir().expect("tempdir");
    let result: Result<ApiConfig, ConfigError> = load_config(Some(dir.path().join("absent.toml")));
    assert!(matches!(result, Err(ConfigError::Config { .. })));
}
