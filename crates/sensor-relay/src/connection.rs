//! Per-connection handler: register, then pump frames both ways.

use std::borrow::Cow;
use std::net::SocketAddr;
use std::time::Duration;

use axum::extract::ws::{close_code, CloseFrame, Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use sensor_common::{ConnectionId, RelayError};

use crate::hub::{Hub, Peer};

/// Handle a single upgraded WebSocket connection until it closes.
pub async fn handle_connection(
    socket: WebSocket,
    addr: SocketAddr,
    hub: Hub,
    write_timeout: Duration,
) {
    let (mut sink, mut stream) = socket.split();

    // 1. Register. A full hub turns the client away with "try again later".
    let Peer { id, mut rx } = match hub.connect().await {
        Ok(peer) => peer,
        Err(e) => {
            tracing::warn!(peer = %addr, error = %e, "Rejecting client");
            let _ = sink
                .send(Message::Close(Some(CloseFrame {
                    code: close_code::AGAIN,
                    reason: Cow::from(e.to_string()),
                })))
                .await;
            return;
        }
    };

    tracing::info!(peer = %addr, connection = %id, "New client connected for real-time data");

    // 2. Forwarding loop.
    loop {
        tokio::select! {
            // Frames queued by the hub -> this client's socket
            outbound = rx.recv() => {
                let Some(frame) = outbound else {
                    tracing::debug!(connection = %id, "Dropped by hub");
                    break;
                };
                let write = sink.send(Message::Text(frame.to_string()));
                match tokio::time::timeout(write_timeout, write).await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::debug!(connection = %id, error = %e, "WS write failed");
                        break;
                    }
                    Err(_) => {
                        tracing::warn!(connection = %id, "WS write timed out");
                        break;
                    }
                }
            }

            // Frames from this client -> everyone
            frame = stream.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => relay(&hub, &id, &text).await,
                    Some(Ok(Message::Binary(bytes))) => match std::str::from_utf8(&bytes) {
                        Ok(text) => relay(&hub, &id, text).await,
                        Err(e) => log_parse_error(&id, &RelayError::Parse(e.to_string())),
                    },
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(e)) => {
                        tracing::debug!(peer = %addr, error = %e, "WS error");
                        break;
                    }
                    // Ping/pong are answered by the protocol layer.
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    // 3. Cleanup.
    hub.disconnect(&id).await;
    tracing::info!(peer = %addr, connection = %id, "Client disconnected");
}

async fn relay(hub: &Hub, source: &ConnectionId, text: &str) {
    match hub.relay(source, text).await {
        Ok(delivery) => {
            if delivery.evicted > 0 {
                tracing::debug!(
                    connection = %source,
                    delivered = delivery.delivered,
                    evicted = delivery.evicted,
                    "Broadcast dropped clients"
                );
            }
        }
        Err(e) => log_parse_error(source, &e),
    }
}

fn log_parse_error(source: &ConnectionId, error: &RelayError) {
    tracing::warn!(connection = %source, error = %error, "Error parsing sensor data");
}
