//! Validation for the server, influxdb and relay sections.

use crate::schema::RelayServerConfig;

use super::helpers::{validate_non_empty, validate_range};

/// Validate listener settings.
pub(crate) fn validate_server(errors: &mut Vec<String>, config: &RelayServerConfig) {
    validate_non_empty(errors, "server.bind", &config.server.bind);
    validate_range(errors, "server.port", config.server.port.into(), 1, 65535);
}

/// Validate backend settings. The token and org may be empty for
/// unauthenticated local instances.
pub(crate) fn validate_influxdb(errors: &mut Vec<String>, config: &RelayServerConfig) {
    let influx = &config.influxdb;
    if !(influx.url.starts_with("http://") || influx.url.starts_with("https://")) {
        errors.push(format!(
            "influxdb.url = {:?} must start with http:// or https://",
            influx.url
        ));
    }
    validate_non_empty(errors, "influxdb.bucket", &influx.bucket);
    validate_non_empty(errors, "influxdb.measurement", &influx.measurement);
    validate_non_empty(errors, "influxdb.field", &influx.field);
    validate_range(
        errors,
        "influxdb.query_timeout_secs",
        influx.query_timeout_secs,
        1,
        600,
    );
}

/// Validate hub limits.
pub(crate) fn validate_relay(errors: &mut Vec<String>, config: &RelayServerConfig) {
    validate_range(
        errors,
        "relay.queue_capacity",
        config.relay.queue_capacity as u64,
        1,
        65536,
    );
    validate_range(
        errors,
        "relay.write_timeout_secs",
        config.relay.write_timeout_secs,
        1,
        300,
    );
}
