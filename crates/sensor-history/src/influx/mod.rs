//! InfluxDB v2 query backend.
//!
//! Sends Flux to `/api/v2/query` and streams the annotated-CSV response
//! back as [`FluxRecord`](crate::FluxRecord)s.

mod client;
mod config;
mod csv;


pub use client::InfluxClient;
pub use config::InfluxConfig;
