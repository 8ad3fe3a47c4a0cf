// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Webhook route for Eventbrite attendee notifications.

use crate::AppState;
use axum::{body::Bytes, extract::State, routing::post, Json, Router};
use serde::Serialize;
use std::sync::Arc;

/// Webhook routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/webhook", post(handle_event))
}

/// Acknowledgement returned for every notification.
#[derive(Serialize)]
pub struct WebhookAck {
    pub received: bool,
}

/// Handle incoming webhook events (POST).
///
/// Always answers `200 {"received": true}` before any processing; outcomes
/// are only logged. The body is taken raw so invalid JSON is acknowledged too.
async fn handle_event(State(state): State<Arc<AppState>>, body: Bytes) -> Json<WebhookAck> {
    match serde_json::from_slice::<serde_json::Value>(&body) {
        Ok(payload) => {
            // Payloads can embed attendee contact details.
            tracing::debug!(payload = %payload, "Webhook event received (raw)");
            state.webhooks.spawn(payload);
        }
        Err(e) => {
            tracing::info!(
                error = %e,
                bytes = body.len(),
                "Ignoring webhook body that is not JSON"
            );
        }
    }

    Json(WebhookAck { received: true })
}
