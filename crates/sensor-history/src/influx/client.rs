//! InfluxDB HTTP client and its `QueryBackend` implementation.

use async_trait::async_trait;
use futures_util::StreamExt;
use sensor_common::HistoryError;
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};
use tokio_util::io::StreamReader;
use tracing::debug;

use crate::backend::{QueryBackend, RowStream};
use crate::query::AggregationQuery;

use super::config::InfluxConfig;
use super::csv::TableParser;

/// Longest CSV line accepted from the backend.
pub(crate) const MAX_LINE_BYTES: usize = 1024 * 1024;

/// InfluxDB v2 query client.
pub struct InfluxClient {
    pub(crate) config: InfluxConfig,
    pub(crate) http: reqwest::Client,
}

impl InfluxClient {
    pub fn new(config: InfluxConfig) -> Result<Self, HistoryError> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| HistoryError::Query(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, http })
    }

    /// JSON request body for `/api/v2/query`.
    pub(crate) fn build_request_body(query: &AggregationQuery) -> serde_json::Value {
        serde_json::json!({
            "query": query.to_flux(),
            "type": "flux",
            "dialect": {
                "header": true,
                "annotations": [],
                "delimiter": ",",
            }
        })
    }
}

#[async_trait]
impl QueryBackend for InfluxClient {
    async fn query_rows(&self, query: &AggregationQuery) -> Result<RowStream, HistoryError> {
        let body = Self::build_request_body(query);

        debug!(
            bucket = %query.bucket,
            lookback = %query.lookback(),
            window = %query.window(),
            "InfluxDB query request"
        );

        let response = self
            .http
            .post(self.config.query_url())
            .query(&[("org", self.config.org.as_str())])
            .header("authorization", format!("Token {}", self.config.token))
            .header("accept", "application/csv")
            .json(&body)
            .send()
            .await
            .map_err(|e| HistoryError::Query(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(HistoryError::Query(error_message(status, &text)));
        }

        let byte_stream = response
            .bytes_stream()
            .map(|result| result.map_err(std::io::Error::other));
        let lines = FramedRead::new(
            StreamReader::new(byte_stream),
            LinesCodec::new_with_max_length(MAX_LINE_BYTES),
        );

        // The trailing flag ends the stream after the first error item.
        let rows = futures_util::stream::unfold(
            (lines, TableParser::default(), false),
            |(mut lines, mut parser, failed)| async move {
                if failed {
                    return None;
                }
                loop {
                    match lines.next().await {
                        Some(Ok(line)) => {
                            if let Some(item) = parser.push_line(&line) {
                                let failed = item.is_err();
                                return Some((item, (lines, parser, failed)));
                            }
                        }
                        Some(Err(e)) => {
                            let message = match e {
                                LinesCodecError::MaxLineLengthExceeded => {
                                    format!("result line exceeds {MAX_LINE_BYTES} bytes")
                                }
                                LinesCodecError::Io(e) => format!("result stream failed: {e}"),
                            };
                            let item = Err(HistoryError::Query(message));
                            return Some((item, (lines, parser, true)));
                        }
                        None => return None,
                    }
                }
            },
        );

        Ok(rows.boxed())
    }
}

/// Extract the `message` of an InfluxDB JSON error body, falling back to
/// the raw text.
pub(crate) fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| json["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| format!("HTTP {status}: {body}"))
}
