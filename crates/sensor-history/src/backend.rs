//! Row-streaming backend seam.

use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::stream::BoxStream;
use sensor_common::HistoryError;

use crate::query::AggregationQuery;

/// Rows arrive lazily; an `Err` item aborts the query.
pub type RowStream = BoxStream<'static, Result<FluxRecord, HistoryError>>;

/// One result row, keyed by column name (`_time`, `_value`, `_field`, ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FluxRecord {
    columns: HashMap<String, String>,
}

impl FluxRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.columns.insert(column.into(), value.into());
        self
    }

    /// Column value, with empty cells treated as absent.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns
            .get(column)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl FromIterator<(String, String)> for FluxRecord {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().collect(),
        }
    }
}

/// A time-series store that can execute an aggregation and stream its rows.
#[async_trait]
pub trait QueryBackend: Send + Sync {
    async fn query_rows(&self, query: &AggregationQuery) -> Result<RowStream, HistoryError>;
}
