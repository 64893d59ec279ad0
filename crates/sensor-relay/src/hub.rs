//! Broadcast hub: the set of live connections and fan-out between them.

use std::collections::HashMap;
use std::sync::Arc;

use sensor_common::{ConnectionId, RelayError};
use sensor_config::RelayConfig;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, RwLock};

/// Serialized frame shared by every recipient of one broadcast.
pub type Frame = Arc<str>;

/// Default per-connection outbound queue depth.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// A registered connection: its id and the queue of frames to write to it.
///
/// The queue closes when the hub drops the connection (on disconnect or
/// after a failed send), which is the signal for the socket task to exit.
pub struct Peer {
    pub id: ConnectionId,
    pub rx: mpsc::Receiver<Frame>,
}

/// Outcome of one broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    pub evicted: usize,
}

/// Thread-safe connection registry.
///
/// Every member is both publisher and subscriber. A connection is `Open`
/// exactly while it is in the map. Cloning shares the same set.
#[derive(Clone)]
pub struct Hub {
    connections: Arc<RwLock<HashMap<ConnectionId, mpsc::Sender<Frame>>>>,
    queue_capacity: usize,
    max_connections: Option<usize>,
}

impl Default for Hub {
    fn default() -> Self {
        Self::new()
    }
}

impl Hub {
    /// Unbounded hub with the default queue depth.
    pub fn new() -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_connections: None,
        }
    }

    pub fn from_config(config: &RelayConfig) -> Self {
        Self::new()
            .with_queue_capacity(config.queue_capacity)
            .with_max_connections(config.connection_limit())
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn with_max_connections(mut self, limit: Option<usize>) -> Self {
        self.max_connections = limit;
        self
    }

    /// Register a new connection in the `Open` state.
    pub async fn connect(&self) -> Result<Peer, RelayError> {
        let (tx, rx) = mpsc::channel(self.queue_capacity);
        let id = ConnectionId::new();

        let mut map = self.connections.write().await;
        if let Some(limit) = self.max_connections {
            if map.len() >= limit {
                return Err(RelayError::Capacity(limit));
            }
        }
        map.insert(id.clone(), tx);
        Ok(Peer { id, rx })
    }

    /// Parse an inbound payload and broadcast it to every open connection,
    /// the sender included.
    ///
    /// A payload that is not JSON is rejected with `RelayError::Parse` and
    /// delivered to nobody.
    pub async fn relay(&self, source: &ConnectionId, raw: &str) -> Result<Delivery, RelayError> {
        let payload: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| RelayError::Parse(e.to_string()))?;

        tracing::debug!(connection = %source, bytes = raw.len(), "Relaying reading");
        Ok(self.broadcast(&payload).await)
    }

    /// Send a re-serialized copy of `payload` to every open connection.
    ///
    /// Never blocks on a recipient: a full or closed queue evicts that
    /// recipient and delivery to the rest continues.
    pub async fn broadcast(&self, payload: &serde_json::Value) -> Delivery {
        let frame: Frame = Arc::from(payload.to_string());

        // Snapshot so sends happen without holding the lock.
        let recipients: Vec<(ConnectionId, mpsc::Sender<Frame>)> = {
            let map = self.connections.read().await;
            map.iter()
                .map(|(id, tx)| (id.clone(), tx.clone()))
                .collect()
        };

        let mut delivery = Delivery::default();
        let mut failed = Vec::new();
        for (id, tx) in recipients {
            match tx.try_send(frame.clone()) {
                Ok(()) => delivery.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    let err = RelayError::Send("outbound queue full".into());
                    tracing::warn!(connection = %id, error = %err, "Dropping slow client");
                    failed.push(id);
                }
                Err(TrySendError::Closed(_)) => {
                    tracing::debug!(connection = %id, "Recipient already gone");
                    failed.push(id);
                }
            }
        }

        if !failed.is_empty() {
            let mut map = self.connections.write().await;
            for id in &failed {
                if map.remove(id).is_some() {
                    delivery.evicted += 1;
                }
            }
        }

        delivery
    }

    /// Remove a connection. Returns false if it was already gone.
    pub async fn disconnect(&self, id: &ConnectionId) -> bool {
        self.connections.write().await.remove(id).is_some()
    }

    /// Whether `id` is currently open.
    pub async fn is_open(&self, id: &ConnectionId) -> bool {
        self.connections.read().await.contains_key(id)
    }

    /// Number of open connections.
    pub async fn count(&self) -> usize {
        self.connections.read().await.len()
    }
}
