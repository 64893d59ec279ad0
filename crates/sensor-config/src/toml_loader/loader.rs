//! Core TOML config loading: read from path or platform default.

use crate::schema::RelayServerConfig;
use sensor_common::ConfigError;
use std::fmt;
use std::path::{Path, PathBuf};

use super::paths::default_config_path;

/// Where the file layer of a configuration came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Defaults,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigSource::File(path) => write!(f, "{}", path.display()),
            ConfigSource::Defaults => f.write_str("built-in defaults"),
        }
    }
}

/// Load config from a specific TOML file path.
///
/// Deserializes the file using serde defaults for any missing fields.
/// Validation is left to the caller so environment overrides can be applied
/// first.
pub fn load_from_path(path: &Path) -> Result<RelayServerConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ConfigError::FileNotFound(path.to_path_buf())
        } else {
            ConfigError::ParseError(format!("failed to read {}: {e}", path.display()))
        }
    })?;

    let config: RelayServerConfig = toml::from_str(&content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    Ok(config)
}

/// Load config from the platform-specific default path.
///
/// On macOS: `~/Library/Application Support/sensor-relay/config.toml`
/// On Linux: `~/.config/sensor-relay/config.toml`
///
/// A missing file is not an error: the relay runs on defaults plus
/// environment overrides.
pub fn load_default() -> Result<(RelayServerConfig, ConfigSource), ConfigError> {
    let path = match default_config_path() {
        Ok(path) => path,
        Err(_) => return Ok((RelayServerConfig::default(), ConfigSource::Defaults)),
    };

    match load_from_path(&path) {
        Ok(config) => Ok((config, ConfigSource::File(path))),
        Err(ConfigError::FileNotFound(_)) => {
            Ok((RelayServerConfig::default(), ConfigSource::Defaults))
        }
        Err(e) => Err(e),
    }
}
