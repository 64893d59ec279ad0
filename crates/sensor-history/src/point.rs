use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

/// One aggregated sample as returned to HTTP callers:
/// `{"time": "2024-05-01T12:00:00.000Z", "random": 41.5}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoricalPoint {
    #[serde(serialize_with = "iso_millis")]
    pub time: DateTime<Utc>,
    #[serde(rename = "random")]
    pub value: f64,
}

impl HistoricalPoint {
    pub fn new(time: DateTime<Utc>, value: f64) -> Self {
        Self { time, value }
    }
}

fn iso_millis<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&time.to_rfc3339_opts(SecondsFormat::Millis, true))
}
