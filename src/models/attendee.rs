// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Attendee model for storage, updates and API responses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Check-in status of an attendee.
///
/// Eventbrite governs the exact vocabulary, so tokens that don't spell one of
/// the known states are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AttendeeStatus {
    Unknown,
    Updated,
    CheckedIn,
    CheckedOut,
    NotCheckedIn,
    Other(String),
}

impl AttendeeStatus {
    /// Parse a status or webhook action token.
    ///
    /// Matching is case-insensitive and treats spaces and hyphens as
    /// underscores, so `"Checked In"` is `CheckedIn`. Anything else, including
    /// `"check_in"`, is preserved as given.
    pub fn from_token(token: &str) -> Self {
        let normalized = token.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "unknown" => AttendeeStatus::Unknown,
            "updated" => AttendeeStatus::Updated,
            "checked_in" => AttendeeStatus::CheckedIn,
            "checked_out" => AttendeeStatus::CheckedOut,
            "not_checked_in" => AttendeeStatus::NotCheckedIn,
            _ => AttendeeStatus::Other(token.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            AttendeeStatus::Unknown => "unknown",
            AttendeeStatus::Updated => "updated",
            AttendeeStatus::CheckedIn => "checked_in",
            AttendeeStatus::CheckedOut => "checked_out",
            AttendeeStatus::NotCheckedIn => "not_checked_in",
            AttendeeStatus::Other(token) => token,
        }
    }

    /// Checked-in flag implied by the status, if the status implies one.
    pub fn implied_checked_in(&self) -> Option<bool> {
        match self {
            AttendeeStatus::CheckedIn => Some(true),
            AttendeeStatus::CheckedOut | AttendeeStatus::NotCheckedIn => Some(false),
            _ => None,
        }
    }
}

impl From<String> for AttendeeStatus {
    fn from(token: String) -> Self {
        AttendeeStatus::from_token(&token)
    }
}

impl From<AttendeeStatus> for String {
    fn from(status: AttendeeStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for AttendeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One answer to a registration question, kept in upstream order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub question: String,
    pub answer: Option<String>,
}

/// Stored attendee record (Firestore `attendees` collection).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    /// Eventbrite attendee ID (also used as document ID)
    pub id: String,
    /// Display name
    pub name: String,
    /// Email address (may be None if not shared)
    pub email: Option<String>,
    pub status: AttendeeStatus,
    pub checked_in: bool,
    /// Registration answers in question order
    #[serde(default)]
    pub answers: Vec<Answer>,
    /// Owning Eventbrite event, when the ingestion path knew it
    pub event_id: Option<String>,
    /// First sighting
    pub created_at: DateTime<Utc>,
    /// Strictly increases on every accepted upsert
    pub updated_at: DateTime<Utc>,
}

/// Fields of an [`Attendee`] that an upsert may merge into an existing record.
///
/// The identifier is the key and never appears here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttendeeField {
    Name,
    Email,
    Status,
    CheckedIn,
    Answers,
    EventId,
}

/// Merge set used by webhook reconciliation.
pub const WEBHOOK_MERGE_FIELDS: &[AttendeeField] = &[
    AttendeeField::Name,
    AttendeeField::Email,
    AttendeeField::Status,
    AttendeeField::CheckedIn,
    AttendeeField::Answers,
    AttendeeField::EventId,
];

/// Merge set used by roster pulls. Status is left to webhooks so a pull never
/// rolls back a check-in that arrived in between.
pub const ROSTER_MERGE_FIELDS: &[AttendeeField] = &[
    AttendeeField::Name,
    AttendeeField::Email,
    AttendeeField::Answers,
    AttendeeField::EventId,
];

/// Name given to an attendee first seen without one.
pub const UNKNOWN_NAME: &str = "Unknown";

/// Canonical, source-agnostic attendee update.
///
/// Produced by the webhook normalizer and the roster mapper. A `None` field is
/// absent from the update and never overwrites stored data.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendeeUpdate {
    pub id: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub status: Option<AttendeeStatus>,
    pub checked_in: Option<bool>,
    pub answers: Option<Vec<Answer>>,
    pub event_id: Option<String>,
}

impl AttendeeUpdate {
    /// Update carrying only an identifier; chain the `with_*` setters.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_status(mut self, status: AttendeeStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_checked_in(mut self, checked_in: bool) -> Self {
        self.checked_in = Some(checked_in);
        self
    }

    /// Build a fresh record from this update (first sighting).
    ///
    /// A missing name becomes [`UNKNOWN_NAME`]; later updates without a name
    /// leave the stored one alone.
    pub fn to_new_attendee(&self, now: DateTime<Utc>) -> Attendee {
        let status = self.status.clone().unwrap_or(AttendeeStatus::Unknown);
        let checked_in = self
            .checked_in
            .or_else(|| status.implied_checked_in())
            .unwrap_or(false);

        Attendee {
            id: self.id.clone(),
            name: self
                .name
                .clone()
                .unwrap_or_else(|| UNKNOWN_NAME.to_string()),
            email: self.email.clone(),
            status,
            checked_in,
            answers: self.answers.clone().unwrap_or_default(),
            event_id: self.event_id.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Copy the fields listed in `fields` that this update carries onto
    /// `existing`. Returns true if anything was copied.
    pub fn merge_into(&self, existing: &mut Attendee, fields: &[AttendeeField]) -> bool {
        let mut touched = false;
        for field in fields {
            match field {
                AttendeeField::Name => {
                    if let Some(name) = &self.name {
                        existing.name = name.clone();
                        touched = true;
                    }
                }
                AttendeeField::Email => {
                    if let Some(email) = &self.email {
                        existing.email = Some(email.clone());
                        touched = true;
                    }
                }
                AttendeeField::Status => {
                    if let Some(status) = &self.status {
                        existing.status = status.clone();
                        touched = true;
                    }
                }
                AttendeeField::CheckedIn => {
                    if let Some(checked_in) = self.checked_in {
                        existing.checked_in = checked_in;
                        touched = true;
                    }
                }
                AttendeeField::Answers => {
                    if let Some(answers) = &self.answers {
                        existing.answers = answers.clone();
                        touched = true;
                    }
                }
                AttendeeField::EventId => {
                    if let Some(event_id) = &self.event_id {
                        existing.event_id = Some(event_id.clone());
                        touched = true;
                    }
                }
            }
        }
        touched
    }
}
