// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Live update channel (WebSocket).
//!
//! **Server → Client** frames are JSON [`LiveMessage`](crate::models::LiveMessage)
//! values: one `connected` frame on upgrade, then `attendee_updated` frames.
//! Anything the client sends is ignored apart from close frames.

use crate::services::broadcast::Subscription;
use crate::AppState;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/live", get(upgrade))
}

async fn upgrade(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Pump broadcaster frames into the socket until either side goes away.
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let Subscription { id, mut receiver } = state.broadcaster.register();

    let (mut sender, mut incoming) = socket.split();

    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = receiver.recv().await {
            if sender.send(Message::text(frame.to_string())).await.is_err() {
                break;
            }
        }
        tracing::debug!(subscriber_id = id, "Live send task terminated");
    });

    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = incoming.next().await {
            if let Message::Close(_) = msg {
                break;
            }
        }
        tracing::debug!(subscriber_id = id, "Live receive task terminated");
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    }

    state.broadcaster.unregister(id);
}
