use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// HTTP listener shared by the history API, the relay upgrade and static files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
    /// Directory served for any GET that is neither an API route nor an upgrade.
    pub static_dir: PathBuf,
}

impl ServerConfig {
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".into(),
            port: 3001,
            static_dir: PathBuf::from("public"),
        }
    }
}
