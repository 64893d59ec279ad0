//! Aggregation query descriptor and its Flux rendering.

use std::fmt;

use sensor_config::InfluxDbConfig;

use crate::range::RangeWindow;

/// The series a historical query reads. Comes from configuration, never from
/// the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryTarget {
    pub bucket: String,
    pub measurement: String,
    pub field: String,
}

impl QueryTarget {
    pub fn new(
        bucket: impl Into<String>,
        measurement: impl Into<String>,
        field: impl Into<String>,
    ) -> Self {
        Self {
            bucket: bucket.into(),
            measurement: measurement.into(),
            field: field.into(),
        }
    }
}

impl From<&InfluxDbConfig> for QueryTarget {
    fn from(config: &InfluxDbConfig) -> Self {
        Self::new(&config.bucket, &config.measurement, &config.field)
    }
}

/// Aggregation applied to each window. Historical points are always means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregateFn {
    #[default]
    Mean,
}

impl fmt::Display for AggregateFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AggregateFn::Mean => f.write_str("mean"),
        }
    }
}

/// Immutable description of one windowed aggregation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregationQuery {
    pub bucket: String,
    pub measurement: String,
    pub field: String,
    pub range: RangeWindow,
    pub aggregate_fn: AggregateFn,
    pub create_empty: bool,
    pub sort_ascending: bool,
}

impl AggregationQuery {
    /// Mean over each window, empty windows skipped, ascending by time.
    pub fn new(target: &QueryTarget, range: RangeWindow) -> Self {
        Self {
            bucket: target.bucket.clone(),
            measurement: target.measurement.clone(),
            field: target.field.clone(),
            range,
            aggregate_fn: AggregateFn::Mean,
            create_empty: false,
            sort_ascending: true,
        }
    }

    pub fn lookback(&self) -> String {
        self.range.lookback_literal()
    }

    pub fn window(&self) -> String {
        self.range.window_literal()
    }

    /// Render as a Flux script.
    pub fn to_flux(&self) -> String {
        format!(
            "from(bucket: {bucket})\n  \
             |> range(start: {lookback})\n  \
             |> filter(fn: (r) => r._measurement == {measurement} and r._field == {field})\n  \
             |> aggregateWindow(every: {window}, fn: {agg}, createEmpty: {create_empty})\n  \
             |> sort(columns: [\"_time\"], desc: {desc})",
            bucket = flux_string(&self.bucket),
            lookback = self.lookback(),
            measurement = flux_string(&self.measurement),
            field = flux_string(&self.field),
            window = self.window(),
            agg = self.aggregate_fn,
            create_empty = self.create_empty,
            desc = !self.sort_ascending,
        )
    }
}

/// Quote a value as a Flux string literal.
pub(crate) fn flux_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            // `${` starts string interpolation in Flux.
            '$' => out.push_str("\\$"),
            _ => out.push(ch),
        }
    }
    out.push('"');
    out
}
