// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reconciliation of canonical updates into the attendee mirror.
//!
//! Both ingestion paths converge here:
//! - Webhook updates are upserted and the stored (merged) record is broadcast.
//! - Roster pulls are upserted without broadcasting.

use crate::error::Result;
use crate::models::{
    Attendee, AttendeeStatus, AttendeeUpdate, LiveMessage, ROSTER_MERGE_FIELDS,
    WEBHOOK_MERGE_FIELDS,
};
use crate::services::attendees::AttendeeRepository;
use crate::services::broadcast::Broadcaster;
use crate::services::eventbrite::UpstreamAttendee;
use futures_util::{stream, StreamExt};
use serde_json::Value;

const MAX_CONCURRENT_DB_OPS: usize = 50;

/// Summary of one roster ingestion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RosterIngest {
    pub stored: usize,
    pub skipped: usize,
}

#[derive(Clone)]
pub struct Reconciler {
    attendees: AttendeeRepository,
    broadcaster: Broadcaster,
}

impl Reconciler {
    pub fn new(attendees: AttendeeRepository, broadcaster: Broadcaster) -> Self {
        Self {
            attendees,
            broadcaster,
        }
    }

    /// Upsert a webhook update and broadcast the stored record.
    ///
    /// A storage failure abandons the update: nothing is broadcast and the
    /// error is returned for the caller to log.
    pub async fn reconcile(&self, update: &AttendeeUpdate) -> Result<Attendee> {
        let stored = self.attendees.upsert(update, WEBHOOK_MERGE_FIELDS).await?;

        let report = self.broadcaster.broadcast(&LiveMessage::AttendeeUpdated {
            attendee: stored.clone(),
        });

        tracing::info!(
            attendee_id = %stored.id,
            status = %stored.status,
            subscribers = report.delivered,
            "Attendee reconciled"
        );
        Ok(stored)
    }

    /// Upsert every attendee of a pulled roster. No broadcast.
    ///
    /// Attendees without an ID, or that don't parse, are skipped. The first
    /// storage error aborts the ingestion.
    pub async fn ingest_roster(&self, event_id: &str, roster: &[Value]) -> Result<RosterIngest> {
        let mut skipped = 0;
        let updates: Vec<AttendeeUpdate> = roster
            .iter()
            .filter_map(|raw| match roster_update(event_id, raw) {
                Some(update) => Some(update),
                None => {
                    skipped += 1;
                    None
                }
            })
            .collect();

        if skipped > 0 {
            tracing::warn!(event_id, skipped, "Skipped roster entries without usable id");
        }

        let stored = updates.len();
        stream::iter(updates)
            .map(|update| {
                let attendees = self.attendees.clone();
                async move { attendees.upsert(&update, ROSTER_MERGE_FIELDS).await }
            })
            .buffer_unordered(MAX_CONCURRENT_DB_OPS)
            .collect::<Vec<Result<Attendee>>>()
            .await
            .into_iter()
            .collect::<Result<Vec<Attendee>>>()?;

        tracing::info!(event_id, stored, skipped, "Roster ingested");
        Ok(RosterIngest { stored, skipped })
    }
}

/// Map one roster entry. New attendees default to `updated`.
fn roster_update(event_id: &str, raw: &Value) -> Option<AttendeeUpdate> {
    let attendee: UpstreamAttendee = serde_json::from_value(raw.clone()).ok()?;
    let id = attendee.id.clone()?;

    let status = attendee
        .status
        .as_deref()
        .map(AttendeeStatus::from_token)
        .unwrap_or(AttendeeStatus::Updated);
    let checked_in = attendee.checked_in.or_else(|| status.implied_checked_in());

    Some(AttendeeUpdate {
        id,
        name: attendee.display_name().map(str::to_string),
        email: attendee.email().map(str::to_string),
        status: Some(status),
        checked_in,
        answers: attendee.answers(),
        event_id: Some(
            attendee
                .event_id
                .clone()
                .unwrap_or_else(|| event_id.to_string()),
        ),
    })
}
