use serde::{Deserialize, Serialize};

/// InfluxDB v2 connection and the series the history API reads.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InfluxDbConfig {
    pub url: String,
    pub token: String,
    pub org: String,
    pub bucket: String,
    pub measurement: String,
    pub field: String,
    /// Deadline for one historical query, request and result stream together.
    pub query_timeout_secs: u64,
}

impl std::fmt::Debug for InfluxDbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InfluxDbConfig")
            .field("url", &self.url)
            .field("token", &"[REDACTED]")
            .field("org", &self.org)
            .field("bucket", &self.bucket)
            .field("measurement", &self.measurement)
            .field("field", &self.field)
            .field("query_timeout_secs", &self.query_timeout_secs)
            .finish()
    }
}

impl Default for InfluxDbConfig {
    fn default() -> Self {
        Self {
            url: "https://us-east-1-1.aws.cloud2.influxdata.com".into(),
            token: String::new(),
            org: String::new(),
            bucket: "sensor_data".into(),
            measurement: "wifi_status".into(),
            field: "random".into(),
            query_timeout_secs: 30,
        }
    }
}
