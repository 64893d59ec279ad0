//! InfluxDB client configuration.

use std::time::Duration;

use sensor_config::InfluxDbConfig;

/// Connection settings for an InfluxDB v2 instance.
#[derive(Clone)]
pub struct InfluxConfig {
    pub url: String,
    pub token: String,
    pub org: String,
    pub connect_timeout: Duration,
}

impl std::fmt::Debug for InfluxConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxConfig")
            .field("url", &self.url)
            .field("token", &"[REDACTED]")
            .field("org", &self.org)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

impl InfluxConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: String::new(),
            org: String::new(),
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn with_org(mut self, org: impl Into<String>) -> Self {
        self.org = org.into();
        self
    }

    /// Query endpoint, e.g. `https://host/api/v2/query`.
    pub(crate) fn query_url(&self) -> String {
        format!("{}/api/v2/query", self.url.trim_end_matches('/'))
    }
}

impl From<&InfluxDbConfig> for InfluxConfig {
    fn from(config: &InfluxDbConfig) -> Self {
        Self::new(&config.url)
            .with_token(&config.token)
            .with_org(&config.org)
    }
}
