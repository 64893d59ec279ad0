use serde::{Deserialize, Serialize};

/// Configuration for the real-time broadcast hub.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Outbound frames buffered per connection before it counts as too slow
    /// and is dropped from the hub.
    pub queue_capacity: usize,
    /// Maximum simultaneous connections. 0 means unlimited.
    pub max_connections: usize,
    /// Upper bound on a single socket write, in seconds.
    pub write_timeout_secs: u64,
}

impl RelayConfig {
    pub fn connection_limit(&self) -> Option<usize> {
        (self.max_connections > 0).then_some(self.max_connections)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 256,
            max_connections: 0,
            write_timeout_secs: 10,
        }
    }
}
