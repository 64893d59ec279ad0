//! Historical sensor data.
//!
//! Turns a relative range token such as `24h` into a ten-point mean
//! aggregation over the configured series and returns the result as an
//! ascending list of points:
//! - [`range`] validates the token and derives lookback and window
//! - [`query`] assembles the backend-agnostic aggregation descriptor
//! - [`backend`] is the row-streaming seam, implemented by [`influx`]
//! - [`service`] ties them together under a deadline

pub mod backend;
pub mod influx;
pub mod point;
pub mod query;
pub mod range;
pub mod service;

pub use backend::{FluxRecord, QueryBackend, RowStream};
pub use influx::{InfluxClient, InfluxConfig};
pub use point::HistoricalPoint;
pub use query::{AggregateFn, AggregationQuery, QueryTarget};
pub use range::{RangeWindow, MAX_HOURS, POINT_COUNT};
pub use service::HistoryService;

pub use sensor_common::HistoryError;
