//! Sensor relay configuration system.
//!
//! Provides TOML-based configuration with `.env` and environment overrides
//! and full validation. All config sections use sensible defaults so
//! partial configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sensor_config::{config_to_json, load_config};
//!
//! let loaded = load_config(None).expect("failed to load config");
//! println!("{}: {}", loaded.source, config_to_json(&loaded.config));
//! ```

pub mod env;
pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use env::{apply_overrides, load_dotenv};
pub use schema::{
    InfluxDbConfig, LogLevel, LoggingConfig, RelayConfig, RelayServerConfig, ServerConfig,
};
pub use toml_loader::{create_default_config, default_config_path, ConfigSource};

use sensor_common::ConfigError;
use std::path::{Path, PathBuf};

/// A validated configuration plus the files it was assembled from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: RelayServerConfig,
    pub source: ConfigSource,
    /// The `.env` file that was read, if any.
    pub dotenv: Option<PathBuf>,
}

/// Load the full configuration.
///
/// Reads `path` if given (a missing file is an error), otherwise the platform
/// default path if it exists. Then `.env` and the process environment are
/// layered on top and the result is validated.
///
/// Sets process environment variables from `.env`, so call it before any
/// other threads are started.
pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig, ConfigError> {
    let dotenv = load_dotenv();
    let (config, source) = load_config_with(path, |key| std::env::var(key).ok())?;
    Ok(LoadedConfig {
        config,
        source,
        dotenv,
    })
}

fn load_config_with(
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(RelayServerConfig, ConfigSource), ConfigError> {
    let (mut config, source) = match path {
        Some(p) => (
            toml_loader::load_from_path(p)?,
            ConfigSource::File(p.to_path_buf()),
        ),
        None => toml_loader::load_default()?,
    };
    env::apply_overrides(&mut config, lookup)?;
    validation::validate(&config)?;
    Ok((config, source))
}

/// Serialize a config to a pretty-printed JSON string, token redacted.
pub fn config_to_json(config: &RelayServerConfig) -> String {
    let mut redacted = config.clone();
    if !redacted.influxdb.token.is_empty() {
        redacted.influxdb.token = "[REDACTED]".into();
    }
    serde_json::to_string_pretty(&redacted)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
