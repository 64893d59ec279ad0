//! HTTP surface: history API, relay upgrade and static files on one listener.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, Path, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use sensor_common::HistoryError;
use sensor_config::RelayServerConfig;
use sensor_history::HistoryService;
use tokio::net::TcpListener;
use tower::ServiceExt;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::connection::handle_connection;
use crate::hub::Hub;
use crate::protocol::{ErrorBody, HealthBody};

/// Shared state handed to every request.
#[derive(Clone)]
pub struct AppState {
    pub hub: Hub,
    pub history: HistoryService,
    pub static_dir: PathBuf,
    pub write_timeout: Duration,
}

impl AppState {
    pub fn new(hub: Hub, history: HistoryService, config: &RelayServerConfig) -> Self {
        Self {
            hub,
            history,
            static_dir: config.server.static_dir.clone(),
            write_timeout: Duration::from_secs(config.relay.write_timeout_secs),
        }
    }
}

/// Build the application router.
///
/// Any request carrying a WebSocket handshake that is not claimed by an API
/// route joins the broadcast hub; other unmatched GETs are served from the
/// static directory.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/historical-data/:range", get(historical_data))
        .route("/health", get(health))
        .fallback(relay_or_static)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve until the listener fails or `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl std::future::Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(
        listener,
        router(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}

async fn historical_data(State(state): State<AppState>, Path(range): Path<String>) -> Response {
    match state.history.historical_data(&range).await {
        Ok(points) => Json(points).into_response(),
        Err(e) => (status_for(&e), Json(ErrorBody::new(e.to_string()))).into_response(),
    }
}

async fn health(State(state): State<AppState>) -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok",
        connections: state.hub.count().await,
    })
}

async fn relay_or_static(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    upgrade: Option<WebSocketUpgrade>,
    request: Request,
) -> Response {
    if let Some(ws) = upgrade {
        let hub = state.hub.clone();
        let write_timeout = state.write_timeout;
        return ws
            .on_failed_upgrade(move |e| {
                tracing::warn!(peer = %addr, error = %e, "WS handshake failed");
            })
            .on_upgrade(move |socket| handle_connection(socket, addr, hub, write_timeout));
    }

    match ServeDir::new(&state.static_dir).oneshot(request).await {
        Ok(response) => response.into_response(),
        Err(never) => match never {},
    }
}

pub(crate) fn status_for(error: &HistoryError) -> StatusCode {
    match error {
        HistoryError::Validation(_) => StatusCode::BAD_REQUEST,
        HistoryError::Query(_) => StatusCode::INTERNAL_SERVER_ERROR,
        HistoryError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
    }
}
