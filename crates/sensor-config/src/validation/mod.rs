//! Full configuration validation.
//!
//! Each section has its own validator; this orchestrator calls them all
//! and collects errors into a single `ConfigError`.

mod helpers;
mod misc;


use crate::schema::RelayServerConfig;
use sensor_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &RelayServerConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    misc::validate_server(&mut errors, config);
    misc::validate_influxdb(&mut errors, config);
    misc::validate_relay(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
