//! HTTP transport.
//!
//! ```text
//! POST /mcp                         - one JSON-RPC message in, one JSON response out
//! GET  /sse                         - event stream; first event names the messages URL
//! POST /messages/?session_id=<id>   - message for an SSE session, answered on its stream
//! GET  /health                      - liveness check
//! ```

use std::sync::Arc;

use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tokio::net::TcpListener;
use tracing::info;

use super::sse::{self, SseSessions, MESSAGES_PATH};
use super::McpServer;
use crate::config::Config;
use crate::error::{ExplorerError, Result};

/// Shared state of the HTTP transport.
#[derive(Clone)]
pub struct HttpState {
    pub server: Arc<McpServer>,
    pub sessions: Arc<SseSessions>,
}

impl FromRef<HttpState> for Arc<McpServer> {
    fn from_ref(state: &HttpState) -> Self {
        state.server.clone()
    }
}

impl FromRef<HttpState> for Arc<SseSessions> {
    fn from_ref(state: &HttpState) -> Self {
        state.sessions.clone()
    }
}

/// Builds the router for the HTTP transport.
pub fn router(server: Arc<McpServer>) -> Router {
    let state = HttpState {
        server,
        sessions: Arc::new(SseSessions::new()),
    };

    Router::new()
        .route("/mcp", post(handle_rpc))
        .route("/sse", get(sse::open_stream))
        .route(MESSAGES_PATH, post(sse::post_message))
        .route("/health", get(health))
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl-C.
pub async fn serve(server: Arc<McpServer>, config: &Config) -> Result<()> {
    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| ExplorerError::config(format!("Failed to bind {address}: {e}")))?;

    info!("Serving MCP over HTTP on http://{}/mcp (SSE on /sse)", address);
    axum::serve(listener, router(server))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ExplorerError::internal(format!("HTTP server failed: {e}")))
}

/// Handles one JSON-RPC message; notifications get `202 Accepted`.
pub async fn handle_rpc(State(server): State<Arc<McpServer>>, body: String) -> Response {
    match server.handle_message(&body).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

pub async fn health() -> &'static str {
    "ok"
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Shutdown signal received");
    }
}
