//! Historical query service: range token in, ordered points out.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::StreamExt;
use sensor_common::HistoryError;
use sensor_config::InfluxDbConfig;
use tracing::{debug, error, warn};

use crate::backend::{FluxRecord, QueryBackend};
use crate::influx::{InfluxClient, InfluxConfig};
use crate::point::HistoricalPoint;
use crate::query::{AggregationQuery, QueryTarget};
use crate::range::RangeWindow;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Executes windowed aggregations against a [`QueryBackend`].
///
/// Cheap to clone; the backend is shared.
#[derive(Clone)]
pub struct HistoryService {
    backend: Arc<dyn QueryBackend>,
    target: QueryTarget,
    timeout: Duration,
}

impl HistoryService {
    pub fn new(backend: Arc<dyn QueryBackend>, target: QueryTarget) -> Self {
        Self {
            backend,
            target,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Service backed by InfluxDB, configured from the `[influxdb]` section.
    pub fn from_config(config: &InfluxDbConfig) -> Result<Self, HistoryError> {
        let client = InfluxClient::new(InfluxConfig::from(config))?;
        Ok(Self::new(Arc::new(client), QueryTarget::from(config))
            .with_timeout(Duration::from_secs(config.query_timeout_secs)))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Mean of the configured field over ten windows covering `range_token`,
    /// ascending by time.
    ///
    /// All-or-nothing: a backend error at any point discards the rows read
    /// so far.
    pub async fn historical_data(
        &self,
        range_token: &str,
    ) -> Result<Vec<HistoricalPoint>, HistoryError> {
        let range = RangeWindow::resolve(range_token).inspect_err(|e| {
            warn!(range = %range_token, error = %e, "Rejected historical range");
        })?;
        let query = AggregationQuery::new(&self.target, range);

        let result = match tokio::time::timeout(self.timeout, self.collect(&query)).await {
            Ok(result) => result,
            Err(_) => Err(HistoryError::Timeout(self.timeout)),
        };

        match &result {
            Ok(points) => debug!(
                range = %range_token,
                window = %query.window(),
                points = points.len(),
                "Historical query complete"
            ),
            Err(e) => error!(range = %range_token, error = %e, "Error executing historical query"),
        }
        result
    }

    async fn collect(&self, query: &AggregationQuery) -> Result<Vec<HistoricalPoint>, HistoryError> {
        let mut rows = self.backend.query_rows(query).await?;
        let mut points = Vec::new();
        while let Some(row) = rows.next().await {
            points.push(point_from_record(&row?)?);
        }
        Ok(points)
    }
}

/// Convert one backend row. A missing `_value` reads as `0`.
pub(crate) fn point_from_record(record: &FluxRecord) -> Result<HistoricalPoint, HistoryError> {
    let raw_time = record
        .get("_time")
        .ok_or_else(|| HistoryError::Query("row has no _time column".into()))?;
    let time = DateTime::parse_from_rfc3339(raw_time)
        .map_err(|e| HistoryError::Query(format!("invalid _time {raw_time:?}: {e}")))?
        .with_timezone(&Utc);

    let value = match record.get("_value") {
        Some(raw) => raw
            .parse::<f64>()
            .map_err(|_| HistoryError::Query(format!("non-numeric _value {raw:?}")))?,
        None => 0.0,
    };

    Ok(HistoricalPoint::new(time, value))
}
