//! WebSocket endpoints for live progress and notification feeds.
//!
//! Each connection registers an mpsc sender in the connection registry
//! under its routing key; the dispatcher task pushes messages into that
//! queue and a per-connection send task drains it onto the socket.
//! Inbound frames are read only to detect disconnect.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use atelier_core::events::RoutingKey;

use crate::metrics::{WS_CONNECTIONS_ACTIVE, WS_CONNECTIONS_TOTAL, WS_MESSAGES_SENT};
use crate::state::AppState;

/// Per-connection send queue depth. A client that stops reading loses
/// messages once this fills rather than backing up the dispatcher.
const SEND_QUEUE_DEPTH: usize = 32;

/// Upgrade handler for a task-scoped progress socket.
pub async fn ws_tasks(
    ws: WebSocketUpgrade,
    Path((username, task_id)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let key = RoutingKey::Task { username, task_id };
    ws.on_upgrade(move |socket| handle_socket(socket, state, key, "tasks"))
}

/// Upgrade handler for a per-user notification socket.
pub async fn ws_notifications(
    ws: WebSocketUpgrade,
    Path(username): Path<String>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let key = RoutingKey::User { username };
    ws.on_upgrade(move |socket| handle_socket(socket, state, key, "notifications"))
}

/// Handle a single WebSocket connection.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>, key: RoutingKey, endpoint: &'static str) {
    let (mut sender, mut receiver) = socket.split();

    let (tx, mut rx) = mpsc::channel::<String>(SEND_QUEUE_DEPTH);
    let connection_id = state.registry().register(key.clone(), tx).await;

    WS_CONNECTIONS_TOTAL.inc();
    WS_CONNECTIONS_ACTIVE.inc();
    info!(?key, "WebSocket client connected");

    // Forward dispatched messages to this client
    let send_task = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            WS_MESSAGES_SENT.with_label_values(&[endpoint]).inc();
            if sender.send(Message::Text(message.into())).await.is_err() {
                debug!("WebSocket send failed, client disconnected");
                break;
            }
        }
    });

    // Drain incoming frames to detect disconnect
    while let Some(result) = receiver.next().await {
        match result {
            Ok(Message::Close(_)) => {
                debug!("WebSocket client requested close");
                break;
            }
            Ok(Message::Ping(data)) => {
                // Pong is handled automatically by axum
                debug!("Received ping: {:?}", data);
            }
            Ok(Message::Text(text)) => {
                debug!("Ignoring client message: {}", text);
            }
            Ok(_) => {}
            Err(e) => {
                warn!("WebSocket receive error: {}", e);
                break;
            }
        }
    }

    // Clean up
    send_task.abort();
    state.registry().unregister(&key, connection_id).await;
    WS_CONNECTIONS_ACTIVE.dec();
    info!(?key, "WebSocket client disconnected");
}
