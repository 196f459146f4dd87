//! Configuration loading and graceful degradation
//!
//! Tests that manipulate VITRINE_CONFIG are marked with #[serial] so they
//! run sequentially, not in parallel.

use serial_test::serial;
use std::env;
use std::io::Write;
use std::path::PathBuf;
use vitrine_common::config::{ConfigOverrides, TomlConfig, CONFIG_ENV_VAR};
use vitrine_common::Error;

fn write_config(contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

#[test]
fn test_minimal_toml_uses_defaults() {
    let config = TomlConfig::from_toml_str("database_path = \"/tmp/v.db\"").unwrap();

    assert_eq!(config.database_path, PathBuf::from("/tmp/v.db"));
    assert_eq!(config.port, 5740);
    assert_eq!(config.logging.level, "info");
    assert!(config.logging.file.is_none());
    assert_eq!(config.resolver.scan_limit, 2000);
    assert_eq!(config.resolver.fetch_concurrency, 8);
}

#[test]
fn test_full_toml() {
    let toml = r#"
        database_path = "/srv/vitrine.db"
        port = 6000

        [logging]
        level = "debug"

        [resolver]
        scan_limit = 500
        strategy_timeout_ms = 250
        fetch_concurrency = 2
    "#;
    let config = TomlConfig::from_toml_str(toml).unwrap();

    assert_eq!(config.port, 6000);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.resolver.scan_limit, 500);
    assert_eq!(config.resolver.strategy_timeout_ms, 250);
    assert_eq!(config.resolver.fetch_concurrency, 2);
}

#[test]
fn test_malformed_toml_is_config_error() {
    let result = TomlConfig::from_toml_str("port = \"not a number\"");
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
fn test_invalid_resolver_values_rejected() {
    let result = TomlConfig::from_toml_str("[resolver]\nfetch_concurrency = 0");
    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_missing_file_falls_back_to_defaults() {
    env::remove_var(CONFIG_ENV_VAR);
    let overrides = ConfigOverrides {
        config_path: Some(PathBuf::from("/nonexistent/vitrine/config.toml")),
        ..ConfigOverrides::default()
    };

    let config = TomlConfig::load(&overrides).unwrap();
    assert_eq!(config.port, 5740);
}

#[test]
#[serial]
fn test_env_var_locates_file() {
    let file = write_config("port = 7001\n");
    env::set_var(CONFIG_ENV_VAR, file.path());

    let config = TomlConfig::load(&ConfigOverrides::default()).unwrap();
    env::remove_var(CONFIG_ENV_VAR);

    assert_eq!(config.port, 7001);
}

#[test]
#[serial]
fn test_cli_overrides_beat_file() {
    let file = write_config("port = 7001\ndatabase_path = \"/tmp/from-file.db\"\n");
    let overrides = ConfigOverrides {
        config_path: Some(file.path().to_path_buf()),
        database_path: Some(PathBuf::from("/tmp/from-cli.db")),
        port: Some(7002),
    };

    let config = TomlConfig::load(&overrides).unwrap();

    assert_eq!(config.port, 7002);
    assert_eq!(config.database_path, PathBuf::from("/tmp/from-cli.db"));
}
