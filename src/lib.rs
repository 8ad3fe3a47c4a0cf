// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Checkin-Sync: keep a check-in app in step with Eventbrite attendees
//!
//! This crate provides the backend that exchanges Eventbrite OAuth codes,
//! mirrors attendee rosters, applies Eventbrite webhooks to the mirror and
//! pushes the resulting attendee state to connected check-in clients.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::Database;
use error::AppError;
use services::{
    AttendeeRepository, Broadcaster, CredentialStore, EventbriteClient, EventbriteService,
    Normalizer, Reconciler, WebhookProcessor,
};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub attendees: AttendeeRepository,
    pub eventbrite: EventbriteService,
    pub reconciler: Reconciler,
    pub broadcaster: Broadcaster,
    pub webhooks: WebhookProcessor,
}

impl AppState {
    /// Wire every service on top of one storage backend and credential store.
    pub fn new(
        config: Config,
        db: Database,
        credentials: CredentialStore,
    ) -> Result<Self, AppError> {
        let client = EventbriteClient::new(&config)?;
        let eventbrite = EventbriteService::new(client, credentials);
        let attendees = AttendeeRepository::new(db);
        let broadcaster = Broadcaster::default();
        let reconciler = Reconciler::new(attendees.clone(), broadcaster.clone());
        let webhooks =
            WebhookProcessor::new(Normalizer::new(eventbrite.clone()), reconciler.clone());

        Ok(Self {
            config,
            attendees,
            eventbrite,
            reconciler,
            broadcaster,
            webhooks,
        })
    }
}
