//! # Demo Server
//!
//! HTTP + WebSocket front end over a [`ChannelHub`].
//!
//! | Path | Description |
//! |------|-------------|
//! | `/ws` | WebSocket: join a channel, receive snapshot + events, send commands |
//! | `/health` | Liveness plus open channels and their subscriber counts |
//! | `/demos` | The demo catalog |
//! | `/channels/:channel` | Current snapshot of one channel |

mod protocol;
mod ws;


pub use protocol::{ClientMessage, ServerMessage, decode_client_message};
pub use ws::{Connection, Incoming, Job, handle_socket, run_commands};

use crate::catalog::DemoDefinition;
use crate::config::ServerConfig;
use crate::router::ChannelHub;
use crate::session::Snapshot;
use anyhow::{Context, Result};
use axum::{
    Json, Router,
    extract::{Path, State, WebSocketUpgrade},
    http::StatusCode,
    response::Response,
    routing::get,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// How often channels with no listeners and no session are forgotten
const PRUNE_INTERVAL: Duration = Duration::from_secs(60);

/// Shared state passed to all request handlers
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<ChannelHub>,
}

#[derive(Debug, Serialize)]
pub struct ChannelStatus {
    pub name: String,
    pub subscribers: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub channels: Vec<ChannelStatus>,
}

/// Build the axum router for `hub`
pub fn app(hub: Arc<ChannelHub>) -> Router {
    Router::new()
        .route("/ws", get(handle_websocket))
        .route("/health", get(handle_health))
        .route("/demos", get(handle_demos))
        .route("/channels/:channel", get(handle_channel))
        .with_state(AppState { hub })
}

/// Bind and serve until ctrl-c
pub async fn serve(config: ServerConfig) -> Result<()> {
    let hub = Arc::new(config.build_hub()?);
    info!(
        demos = hub.catalog().len(),
        delay_ms = config.clustering_delay.as_millis() as u64,
        "demo catalog loaded"
    );

    let pruner = {
        let hub = Arc::clone(&hub);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(PRUNE_INTERVAL);
            loop {
                interval.tick().await;
                hub.prune_idle();
            }
        })
    };

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("Listening on http://{}", config.bind);

    axum::serve(listener, app(hub))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server terminated unexpectedly")?;

    pruner.abort();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed
        std::future::pending::<()>().await;
    }
}

async fn handle_websocket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state.hub))
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    let channels = state
        .hub
        .channels()
        .into_iter()
        .map(|(name, subscribers)| ChannelStatus { name, subscribers })
        .collect();

    Json(HealthResponse {
        status: "ok",
        channels,
    })
}

async fn handle_demos(State(state): State<AppState>) -> Json<Vec<DemoDefinition>> {
    Json(state.hub.catalog().list().to_vec())
}

async fn handle_channel(
    Path(channel): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<Snapshot>, StatusCode> {
    state
        .hub
        .get(&channel)
        .map(|router| Json(router.snapshot()))
        .ok_or(StatusCode::NOT_FOUND)
}
