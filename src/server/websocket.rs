//! WebSocket endpoint pushing [`ServerEvent`]s to browser tabs.

use std::sync::Arc;

use axum::extract::ws::{self, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use crate::notifications::{ClientEvent, ServerEvent};

use super::AppState;

pub async fn ws_handler(State(state): State<Arc<AppState>>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_ws_client(socket, state))
}

/// Forward every broadcast event to one client until either side closes.
async fn handle_ws_client(socket: WebSocket, state: Arc<AppState>) {
    let (mut tx, mut rx) = socket.split();
    let mut events = state.broadcaster.subscribe();
    crate::debug_event!(
        "ws",
        "connected",
        "{} clients",
        state.broadcaster.subscriber_count()
    );

    let send_task = tokio::spawn(async move {
        loop {
            let event: ServerEvent = match events.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("[ws] client lagged by {n} events");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            let json = match event.to_json() {
                Ok(json) => json,
                Err(e) => {
                    tracing::error!("[ws] cannot serialize {event:?}: {e}");
                    continue;
                }
            };
            if tx.send(ws::Message::Text(json.into())).await.is_err() {
                break; // Client disconnected
            }
        }
    });

    while let Some(msg) = rx.next().await {
        match msg {
            Ok(ws::Message::Text(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(ClientEvent::Connect { path }) => {
                    crate::debug_event!("ws", "client on", "{path}");
                }
                Err(_) => crate::debug_event!("ws", "message", "{}", text.as_str()),
            },
            Ok(ws::Message::Close(_)) | Err(_) => break,
            _ => {}
        }
    }

    send_task.abort();
    crate::debug_event!("ws", "disconnected");
}
