//! End-to-end tests: real listener, WebSocket clients and HTTP requests.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use sensor_common::HistoryError;
use sensor_history::{
    AggregationQuery, FluxRecord, HistoryService, QueryBackend, QueryTarget, RowStream,
};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::{serve, AppState, Hub};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Backend that answers every query with the same rows or the same error.
struct FixedBackend {
    rows: Vec<(&'static str, &'static str)>,
    fail: Option<HistoryError>,
}

#[async_trait]
impl QueryBackend for FixedBackend {
    async fn query_rows(&self, _query: &AggregationQuery) -> Result<RowStream, HistoryError> {
        if let Some(e) = &self.fail {
            return Err(e.clone());
        }
        let rows: Vec<Result<FluxRecord, HistoryError>> = self
            .rows
            .iter()
            .map(|(time, value)| Ok(FluxRecord::new().with("_time", *time).with("_value", *value)))
            .collect();
        Ok(futures_util::stream::iter(rows).boxed())
    }
}

fn empty_backend() -> FixedBackend {
    FixedBackend {
        rows: Vec::new(),
        fail: None,
    }
}

fn state(hub: Hub, backend: FixedBackend, static_dir: PathBuf) -> AppState {
    let history = HistoryService::new(
        Arc::new(backend),
        QueryTarget::new("sensor_data", "wifi_status", "random"),
    );
    AppState {
        hub,
        history,
        static_dir,
        write_timeout: Duration::from_secs(5),
    }
}

async fn spawn(state: AppState) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(serve(listener, state, std::future::pending()));
    addr
}

async fn start_with(hub: Hub, backend: FixedBackend, static_dir: PathBuf) -> SocketAddr {
    spawn(state(hub, backend, static_dir)).await
}

async fn start(hub: Hub) -> SocketAddr {
    start_with(hub, empty_backend(), PathBuf::from("public")).await
}

async fn client(addr: SocketAddr) -> Client {
    let (ws, _) = connect_async(format!("ws://{addr}/")).await.unwrap();
    ws
}

async fn wait_for_count(hub: &Hub, expected: usize) {
    for _ in 0..200 {
        if hub.count().await == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("hub never reached {expected} connections");
}

async fn next_text(ws: &mut Client) -> String {
    let frame = tokio::time::timeout(Duration::from_secs(2), ws.next())
        .await
        .expect("timed out waiting for frame")
        .expect("stream ended")
        .expect("websocket error");
    frame.to_text().unwrap().to_string()
}

async fn send_text(ws: &mut Client, text: &str) {
    ws.send(Message::Text(text.to_string().into())).await.unwrap();
}

/// Keep reading `ws` on a background task so it never backs up.
fn drain_in_background(mut ws: Client) {
    tokio::spawn(async move { while let Some(Ok(_)) = ws.next().await {} });
}

/// Read whatever is buffered until the server closes the socket.
async fn read_until_closed(ws: &mut Client) {
    let closed = tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            }
        }
    })
    .await;
    assert!(closed.is_ok(), "server never closed the socket");
}

/// Broadcast large frames until the hub shrinks to `target` connections.
/// Returns how many recipients the hub itself evicted.
async fn flood_until(hub: &Hub, target: usize) -> usize {
    let payload = serde_json::json!({ "pad": "x".repeat(64 * 1024) });
    let mut evicted = 0;
    for _ in 0..2000 {
        evicted += hub.broadcast(&payload).await.evicted;
        if hub.count().await == target {
            return evicted;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    panic!("hub never shrank to {target} connections");
}

#[tokio::test]
async fn every_client_receives_each_reading_once() {
    let hub = Hub::new();
    let addr = start(hub.clone()).await;
    let mut a = client(addr).await;
    let mut b = client(addr).await;
    let mut c = client(addr).await;
    wait_for_count(&hub, 3).await;

    let reading = r#"{"device_id":"device_1","temperature":20,"humidity":50}"#;
    send_text(&mut a, reading).await;
    for ws in [&mut a, &mut b, &mut c] {
        assert_eq!(next_text(ws).await, reading);
    }

    // The next frame anyone sees is the next reading, not a duplicate.
    send_text(&mut b, r#"{"device_id":"device_2"}"#).await;
    for ws in [&mut a, &mut b, &mut c] {
        assert_eq!(next_text(ws).await, r#"{"device_id":"device_2"}"#);
    }
}

#[tokio::test]
async fn readings_from_one_sender_arrive_in_order() {
    let hub = Hub::new();
    let addr = start(hub.clone()).await;
    let mut producer = client(addr).await;
    let mut consumer = client(addr).await;
    wait_for_count(&hub, 2).await;

    for n in 0..20 {
        send_text(&mut producer, &format!(r#"{{"seq":{n}}}"#)).await;
    }
    for n in 0..20 {
        assert_eq!(next_text(&mut consumer).await, format!(r#"{{"seq":{n}}}"#));
    }
}

#[tokio::test]
async fn malformed_payload_is_dropped_and_sender_stays_connected() {
    let hub = Hub::new();
    let addr = start(hub.clone()).await;
    let mut a = client(addr).await;
    let mut b = client(addr).await;
    wait_for_count(&hub, 2).await;

    send_text(&mut a, "temperature=20").await;
    send_text(&mut a, r#"{"ok":true}"#).await;

    assert_eq!(next_text(&mut b).await, r#"{"ok":true}"#);
    assert_eq!(next_text(&mut a).await, r#"{"ok":true}"#);
    assert_eq!(hub.count().await, 2);
}

#[tokio::test]
async fn closed_client_is_skipped() {
    let hub = Hub::new();
    let addr = start(hub.clone()).await;
    let mut a = client(addr).await;
    let mut b = client(addr).await;
    let mut c = client(addr).await;
    wait_for_count(&hub, 3).await;

    b.close(None).await.unwrap();
    wait_for_count(&hub, 2).await;

    send_text(&mut a, r#"{"x":1}"#).await;
    assert_eq!(next_text(&mut a).await, r#"{"x":1}"#);
    assert_eq!(next_text(&mut c).await, r#"{"x":1}"#);
}

#[tokio::test]
async fn binary_json_is_relayed_as_text() {
    let hub = Hub::new();
    let addr = start(hub.clone()).await;
    let mut a = client(addr).await;
    wait_for_count(&hub, 1).await;

    a.send(Message::Binary(br#"{"bin":1}"#.to_vec().into()))
        .await
        .unwrap();
    assert_eq!(next_text(&mut a).await, r#"{"bin":1}"#);
}

#[tokio::test]
async fn connection_limit_closes_extra_clients() {
    let hub = Hub::new().with_max_connections(Some(1));
    let addr = start(hub.clone()).await;
    let _first = client(addr).await;
    wait_for_count(&hub, 1).await;

    let mut second = client(addr).await;
    let frame = tokio::time::timeout(Duration::from_secs(2), second.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    match frame {
        Message::Close(Some(close)) => assert_eq!(close.code, CloseCode::Again),
        other => panic!("expected close frame, got {other:?}"),
    }
    assert_eq!(hub.count().await, 1);
}

#[tokio::test]
async fn client_that_never_reads_is_evicted_and_closed() {
    let hub = Hub::new().with_queue_capacity(4);
    let mut state = state(hub.clone(), empty_backend(), PathBuf::from("public"));
    state.write_timeout = Duration::from_secs(1);
    let addr = spawn(state).await;

    let mut stalled = client(addr).await;
    drain_in_background(client(addr).await);
    wait_for_count(&hub, 2).await;

    // The stalled socket backs up, its queue fills and the hub drops it.
    let evicted = flood_until(&hub, 1).await;
    assert_eq!(evicted, 1);
    read_until_closed(&mut stalled).await;
    assert_eq!(hub.count().await, 1);
}

#[tokio::test]
async fn blocked_socket_write_times_out() {
    let hub = Hub::new();
    let mut state = state(hub.clone(), empty_backend(), PathBuf::from("public"));
    state.write_timeout = Duration::from_millis(200);
    let addr = spawn(state).await;

    let mut stalled = client(addr).await;
    wait_for_count(&hub, 1).await;

    // The queue never fills; the connection task gives up on the write.
    let evicted = flood_until(&hub, 0).await;
    assert_eq!(evicted, 0);
    read_until_closed(&mut stalled).await;
}

#[tokio::test]
async fn historical_data_returns_ordered_points() {
    let backend = FixedBackend {
        rows: vec![
            ("2024-05-01T02:24:00Z", "10.5"),
            ("2024-05-01T04:48:00Z", ""),
        ],
        fail: None,
    };
    let addr = start_with(Hub::new(), backend, PathBuf::from("public")).await;

    let response = reqwest::get(format!("http://{addr}/historical-data/24h"))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(
        body,
        serde_json::json!([
            {"time": "2024-05-01T02:24:00.000Z", "random": 10.5},
            {"time": "2024-05-01T04:48:00.000Z", "random": 0.0},
        ])
    );
}

#[tokio::test]
async fn invalid_range_is_bad_request() {
    let addr = start(Hub::new()).await;

    let response = reqwest::get(format!("http://{addr}/historical-data/0h"))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("greater than zero"));
}

#[tokio::test]
async fn backend_failure_is_server_error() {
    let backend = FixedBackend {
        rows: Vec::new(),
        fail: Some(HistoryError::Query("unauthorized access".into())),
    };
    let addr = start_with(Hub::new(), backend, PathBuf::from("public")).await;

    let response = reqwest::get(format!("http://{addr}/historical-data/24h"))
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"error": "query failed: unauthorized access"}));
}

#[tokio::test]
async fn health_reports_connection_count() {
    let hub = Hub::new();
    let addr = start(hub.clone()).await;
    let _ws = client(addr).await;
    wait_for_count(&hub, 1).await;

    let body: serde_json::Value = reqwest::get(format!("http://{addr}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, serde_json::json!({"status": "ok", "connections": 1}));
}

#[tokio::test]
async fn plain_get_serves_static_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>sensor dashboard</h1>").unwrap();
    let addr = start_with(Hub::new(), empty_backend(), dir.path().to_path_buf()).await;

    let response = reqwest::get(format!("http://{addr}/")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::OK);
    assert!(response.text().await.unwrap().contains("sensor dashboard"));

    let missing = reqwest::get(format!("http://{addr}/nope.js")).await.unwrap();
    assert_eq!(missing.status(), reqwest::StatusCode::NOT_FOUND);
}

#[test]
fn status_mapping() {
    use crate::server::status_for;
    use axum::http::StatusCode;

    assert_eq!(
        status_for(&HistoryError::Validation("x".into())),
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        status_for(&HistoryError::Query("x".into())),
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        status_for(&HistoryError::Timeout(Duration::from_secs(1))),
        StatusCode::GATEWAY_TIMEOUT
    );
}
