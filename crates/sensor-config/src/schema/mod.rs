//! Configuration schema types for the sensor relay.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with defaults matching the hosted deployment.

mod influx;
mod relay;
mod server;
mod system;

pub use influx::*;
pub use relay::*;
pub use server::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Root configuration.
///
/// Only override what you want to change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayServerConfig {
    pub server: ServerConfig,
    pub influxdb: InfluxDbConfig,
    pub relay: RelayConfig,
    pub logging: LoggingConfig,
}

// =============================================================================
// Tests
// =============================================================================
