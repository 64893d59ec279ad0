//! `.env` loading and environment variable overrides.

use std::path::PathBuf;

use crate::schema::RelayServerConfig;
use sensor_common::ConfigError;

/// Load environment variables from a .env file (KEY=VALUE lines).
///
/// Tries the current directory and then the workspace root. Variables that
/// are already set are left untouched. Returns the file that was read.
pub fn load_dotenv() -> Option<PathBuf> {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let candidates = [
        PathBuf::from(".env"),
        manifest_dir.join("..").join("..").join(".env"),
    ];

    for path in candidates {
        if let Ok(contents) = std::fs::read_to_string(&path) {
            for (key, value) in parse_dotenv(&contents) {
                if std::env::var(&key).is_err() {
                    std::env::set_var(key, value);
                }
            }
            return Some(path);
        }
    }
    None
}

/// Parse `.env` content into key/value pairs. Blank lines and `#` comments
/// are skipped; surrounding quotes on values are stripped.
pub(crate) fn parse_dotenv(contents: &str) -> Vec<(String, String)> {
    contents
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            let value = value.trim().trim_matches('"').trim_matches('\'');
            Some((key.to_string(), value.to_string()))
        })
        .collect()
}

/// Apply overrides from an arbitrary lookup. Recognized keys:
/// `PORT`, `INFLUXDB_URL`, `INFLUXDB_TOKEN`, `INFLUXDB_ORG`, `INFLUXDB_BUCKET`.
pub fn apply_overrides(
    config: &mut RelayServerConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(port) = lookup("PORT") {
        config.server.port = port
            .trim()
            .parse()
            .map_err(|_| ConfigError::ParseError(format!("PORT is not a valid port: {port}")))?;
    }
    if let Some(url) = lookup("INFLUXDB_URL") {
        config.influxdb.url = url;
    }
    if let Some(token) = lookup("INFLUXDB_TOKEN") {
        config.influxdb.token = token;
    }
    if let Some(org) = lookup("INFLUXDB_ORG") {
        config.influxdb.org = org;
    }
    if let Some(bucket) = lookup("INFLUXDB_BUCKET") {
        config.influxdb.bucket = bucket;
    }
    Ok(())
}
