//! Bootstrap configuration loading
//!
//! Configuration is minimal and static: database location, HTTP port, logging
//! and resolver tuning. Changing it requires a restart.
//!
//! # Config file priority
//!
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`VITRINE_CONFIG`)
//! 3. User config directory (`<config_dir>/vitrine/config.toml`)
//! 4. Compiled defaults (no file)
//!
//! A missing config file is not fatal: a warning is logged and compiled
//! defaults are used. A file that exists but cannot be parsed is an error.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "VITRINE_CONFIG";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct TomlConfig {
    /// Path to SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,

    /// HTTP server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Composition resolver tuning
    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

/// Resolver tuning
#[derive(Debug, Clone, Deserialize)]
pub struct ResolverConfig {
    /// Maximum records read by a single image-URL scan
    #[serde(default = "default_scan_limit")]
    pub scan_limit: usize,

    /// Per-strategy timeout in milliseconds
    #[serde(default = "default_strategy_timeout_ms")]
    pub strategy_timeout_ms: u64,

    /// Maximum parallel catalog fetches
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            port: default_port(),
            logging: LoggingConfig::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            scan_limit: default_scan_limit(),
            strategy_timeout_ms: default_strategy_timeout_ms(),
            fetch_concurrency: default_fetch_concurrency(),
        }
    }
}

impl ResolverConfig {
    /// Per-strategy timeout as a `Duration`
    pub fn strategy_timeout(&self) -> Duration {
        Duration::from_millis(self.strategy_timeout_ms)
    }

    /// Reject values that would disable scanning, fetching or timing out
    pub fn validate(&self) -> Result<()> {
        if self.scan_limit == 0 {
            return Err(Error::Config("resolver.scan_limit must be at least 1".to_string()));
        }
        if self.fetch_concurrency == 0 {
            return Err(Error::Config(
                "resolver.fetch_concurrency must be at least 1".to_string(),
            ));
        }
        if self.strategy_timeout_ms == 0 {
            return Err(Error::Config(
                "resolver.strategy_timeout_ms must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

fn default_port() -> u16 {
    5740
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_scan_limit() -> usize {
    2000
}

fn default_strategy_timeout_ms() -> u64 {
    5000
}

fn default_fetch_concurrency() -> usize {
    8
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("vitrine").join("vitrine.db"))
        .unwrap_or_else(|| PathBuf::from("./vitrine_data/vitrine.db"))
}

/// Command-line configuration overrides
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub port: Option<u16>,
}

/// Locate the config file following the priority order above
///
/// Returns `None` when no candidate exists.
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: User config directory
    dirs::config_dir()
        .map(|d| d.join("vitrine").join("config.toml"))
        .filter(|p| p.exists())
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        let config: TomlConfig = toml::from_str(toml_str)
            .map_err(|e| Error::Config(format!("Failed to parse TOML: {}", e)))?;
        config.resolver.validate()?;
        Ok(config)
    }

    /// Load configuration, applying command-line overrides
    ///
    /// Falls back to compiled defaults when the resolved file is missing.
    pub fn load(overrides: &ConfigOverrides) -> Result<Self> {
        let mut config = match resolve_config_path(overrides.config_path.as_deref()) {
            Some(path) if path.exists() => {
                let toml_str = std::fs::read_to_string(&path).map_err(|e| {
                    Error::Config(format!("Failed to read config file {:?}: {}", path, e))
                })?;
                let config = Self::from_toml_str(&toml_str)?;
                info!("Loaded TOML configuration from {:?}", path);
                config
            }
            Some(path) => {
                warn!("Config file {:?} not found, using compiled defaults", path);
                Self::default()
            }
            None => {
                warn!("No config file found, using compiled defaults");
                Self::default()
            }
        };

        if let Some(database_path) = &overrides.database_path {
            config.database_path = database_path.clone();
        }
        if let Some(port) = overrides.port {
            config.port = port;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_port() {
        assert_eq!(default_port(), 5740);
    }

    #[test]
    fn test_default_log_level() {
        assert_eq!(default_log_level(), "info");
    }

    #[test]
    fn test_resolver_defaults_are_valid() {
        let resolver = ResolverConfig::default();
        assert!(resolver.validate().is_ok());
        assert_eq!(resolver.strategy_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_scan_limit_rejected() {
        let resolver = ResolverConfig {
            scan_limit: 0,
            ..ResolverConfig::default()
        };
        assert!(matches!(resolver.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_cli_path_wins() {
        let path = PathBuf::from("/tmp/explicit.toml");
        assert_eq!(resolve_config_path(Some(&path)), Some(path));
    }
}
