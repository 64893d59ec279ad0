//! sensor-relay: real-time sensor broadcast plus historical aggregates.
//!
//! Accepts WebSocket connections and relays every JSON reading to all
//! connected clients, and serves `GET /historical-data/{range}` from
//! InfluxDB on the same listener.

pub mod connection;
pub mod hub;
pub mod protocol;
pub mod server;

#[cfg(test)]
mod tests;

pub use hub::{Delivery, Hub, Peer};
pub use server::{router, serve, AppState};
