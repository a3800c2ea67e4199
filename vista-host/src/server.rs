//! HTTP / WebSocket front end.
//!
//! ```text
//!             ┌──────────── reader task ───────────┐
//!  WebSocket ─┤  text frames ─► inbound (mpsc) ─►  ProtocolEngine::serve
//!             └──────────── writer task ◄── Outbox ◄─ ConnectionHandle
//! ```
//!
//! Every socket gets one reader and one writer task; the engine itself runs
//! on the upgrade task. The admin API shares the router and the registry.

use std::future::Future;
use std::time::Duration;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use vista_core::{DEFAULT_FRAME_BUFFER, ProtocolEngine, Registry, channel};

use crate::admin;

/// Inbound text frames buffered ahead of the engine.
const INBOUND_BUFFER: usize = 32;

/// How long the writer may take to flush after the engine is done.
const WRITER_DRAIN: Duration = Duration::from_secs(2);

/// Shared state of every handler.
#[derive(Clone)]
pub struct AppState {
    pub registry: Registry,
    pub engine: ProtocolEngine,
}

impl AppState {
    pub fn new(engine: ProtocolEngine) -> Self {
        Self {
            registry: engine.registry().clone(),
            engine,
        }
    }
}

/// Build the complete router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/ws", get(ws_handler))
        .merge(admin::routes())
        .with_state(state)
}

/// Serve `state` on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.engine))
}

async fn handle_socket(socket: WebSocket, engine: ProtocolEngine) {
    let (mut sink, mut stream) = socket.split();
    let (handle, mut outbox) = channel(DEFAULT_FRAME_BUFFER);
    let conn = handle.id();
    let (inbound_tx, inbound_rx) = mpsc::channel::<String>(INBOUND_BUFFER);
    info!(%conn, "viewer connected");

    let writer = tokio::spawn(async move {
        while let Some(message) = outbox.next().await {
            let text = match message.to_json() {
                Ok(text) => text,
                Err(e) => {
                    warn!(%conn, "failed to serialise message: {e}");
                    continue;
                }
            };
            if sink.send(Message::Text(text)).await.is_err() {
                debug!(%conn, "socket write failed");
                return;
            }
        }
        let _ = sink.send(Message::Close(None)).await;
    });

    let reader = tokio::spawn(async move {
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    if inbound_tx.send(text).await.is_err() {
                        break;
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(Message::Binary(_)) => debug!(%conn, "ignoring binary frame"),
                Ok(_) => {}
                Err(e) => {
                    debug!(%conn, "socket read failed: {e}");
                    break;
                }
            }
        }
    });

    engine.serve(handle, inbound_rx).await;
    reader.abort();

    let abort = writer.abort_handle();
    if tokio::time::timeout(WRITER_DRAIN, writer).await.is_err() {
        debug!(%conn, "writer did not drain in time");
        abort.abort();
    }
    info!(%conn, "viewer disconnected");
}
