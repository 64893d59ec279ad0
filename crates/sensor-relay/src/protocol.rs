//! JSON bodies of the HTTP API. Relay frames are opaque JSON and have no
//! schema here.

use serde::Serialize;

/// Body of every non-2xx API response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Liveness probe.
#[derive(Debug, Serialize)]
pub struct HealthBody {
    pub status: &'static str,
    pub connections: usize,
}
