// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for the check-in client: events, roster pulls and the local
//! attendee mirror.

use crate::error::{AppError, Result};
use crate::models::Attendee;
use crate::AppState;
use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;

const MAX_EVENT_ID_LEN: usize = 64;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/events", get(list_events))
        .route("/attendees/{event_id}", get(pull_attendees))
        .route("/local_attendees", get(local_attendees))
        .route("/local_attendees/{attendee_id}", get(local_attendee))
}

// ─── Upstream ────────────────────────────────────────────────

/// Events visible to the connected Eventbrite account.
async fn list_events(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Value>>> {
    let events = state.eventbrite.list_events().await?;
    tracing::debug!(count = events.len(), "Listed events");
    Ok(Json(events))
}

/// Pull the roster of one event, mirror it locally and return it as fetched.
async fn pull_attendees(
    State(state): State<Arc<AppState>>,
    Path(event_id): Path<String>,
) -> Result<Json<Vec<Value>>> {
    validate_event_id(&event_id)?;

    let roster = state.eventbrite.fetch_roster(&event_id).await?;
    state.reconciler.ingest_roster(&event_id, &roster).await?;

    Ok(Json(roster))
}

fn validate_event_id(event_id: &str) -> Result<()> {
    if event_id.is_empty() || event_id.len() > MAX_EVENT_ID_LEN {
        return Err(AppError::BadRequest(format!(
            "Event ID must be 1-{} characters",
            MAX_EVENT_ID_LEN
        )));
    }
    if !event_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(AppError::BadRequest(
            "Event ID may only contain letters, digits, '-' and '_'".to_string(),
        ));
    }
    Ok(())
}

// ─── Local Mirror ────────────────────────────────────────────

async fn local_attendees(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Attendee>>> {
    Ok(Json(state.attendees.get_all().await?))
}

async fn local_attendee(
    State(state): State<Arc<AppState>>,
    Path(attendee_id): Path<String>,
) -> Result<Json<Attendee>> {
    state
        .attendees
        .get_by_id(&attendee_id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Attendee {}", attendee_id)))
}
