// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Webhook payload normalization.
//!
//! Eventbrite notifications are terse: a `config` object with the action and
//! an `api_url` pointing at the changed attendee. Operators also post
//! hand-written payloads to test connectivity, and older integrations embed
//! the attendee directly as `api_url_object`. [`Notification::classify`]
//! resolves the shape once; [`Normalizer::normalize`] turns it into a single
//! [`AttendeeUpdate`] or decides to ignore it.

use crate::error::AppError;
use crate::models::{AttendeeStatus, AttendeeUpdate};
use crate::services::eventbrite::{EventbriteService, UpstreamAttendee};
use serde_json::Value;

/// Action assumed when a notification carries none.
pub const DEFAULT_ACTION: &str = "updated";

/// Identifier used when a hydrated attendee has no `id`.
///
/// Every such attendee lands on the same record; see `normalize_upstream`.
pub const UNKNOWN_ATTENDEE_ID: &str = "unknown_id";

/// Placeholder attendee produced for manual/test notifications.
pub const PLACEHOLDER_ATTENDEE_ID: &str = "test_attendee";
pub const PLACEHOLDER_NAME: &str = "Test Attendee";
pub const PLACEHOLDER_EMAIL: &str = "test@example.com";

/// Inbound notification, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// Real Eventbrite delivery; the attendee must be fetched from `api_url`.
    Reference { action: String, api_url: String },
    /// Attendee embedded in the payload.
    Inline { action: String, attendee: Value },
    /// Hand-written payload with an action but no attendee reference.
    Manual { action: String },
    /// Nothing usable.
    Malformed,
}

impl Notification {
    pub fn classify(payload: &Value) -> Self {
        let explicit_action = payload
            .get("config")
            .and_then(|c| c.get("action"))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|a| !a.is_empty());
        let action = explicit_action.unwrap_or(DEFAULT_ACTION).to_string();

        if let Some(api_url) = payload
            .get("api_url")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|u| !u.is_empty())
        {
            return Notification::Reference {
                action,
                api_url: api_url.to_string(),
            };
        }

        if let Some(attendee) = payload
            .get("api_url_object")
            .filter(|o| o.get("id").is_some_and(|id| !id.is_null()))
        {
            return Notification::Inline {
                action,
                attendee: attendee.clone(),
            };
        }

        match explicit_action {
            Some(action) => Notification::Manual {
                action: action.to_string(),
            },
            None => Notification::Malformed,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Notification::Reference { .. } => "reference",
            Notification::Inline { .. } => "inline",
            Notification::Manual { .. } => "manual",
            Notification::Malformed => "malformed",
        }
    }
}

/// Turns notifications into canonical updates, hydrating through Eventbrite
/// when needed.
#[derive(Clone)]
pub struct Normalizer {
    eventbrite: EventbriteService,
}

impl Normalizer {
    pub fn new(eventbrite: EventbriteService) -> Self {
        Self { eventbrite }
    }

    /// Produce the canonical update for `notification`.
    ///
    /// `Ok(None)` means the notification is ignored. Errors abort this one
    /// notification; nothing has been written when they are returned.
    pub async fn normalize(
        &self,
        notification: Notification,
    ) -> Result<Option<AttendeeUpdate>, AppError> {
        match notification {
            Notification::Reference { action, api_url } => {
                // No credential means no hydration; fail before any I/O.
                self.eventbrite.credentials().require().await?;

                if !self.eventbrite.client().is_api_locator(&api_url) {
                    tracing::warn!(
                        api_url = %api_url,
                        "Security Alert: webhook api_url outside Eventbrite API, dropping"
                    );
                    return Ok(None);
                }

                let attendee = self.eventbrite.fetch_by_reference(&api_url).await?;
                Ok(Some(normalize_upstream(&attendee, &action)))
            }
            Notification::Inline { action, attendee } => {
                let attendee: UpstreamAttendee = match serde_json::from_value(attendee) {
                    Ok(a) => a,
                    Err(e) => {
                        tracing::info!(error = %e, "Ignoring unparseable inline attendee");
                        return Ok(None);
                    }
                };
                Ok(Some(normalize_inline(&attendee, &action)))
            }
            Notification::Manual { action } => Ok(Some(placeholder_update(&action))),
            Notification::Malformed => {
                tracing::info!("Ignoring notification without attendee reference or action");
                Ok(None)
            }
        }
    }
}

/// Map an Eventbrite attendee into a canonical update.
///
/// The resource's own status wins over `action`. A missing name stays absent
/// so it cannot clobber a stored one. A missing `id` maps to [`UNKNOWN_ATTENDEE_ID`], which merges all
/// unidentified attendees into one record; this is logged every time.
pub fn normalize_upstream(attendee: &UpstreamAttendee, action: &str) -> AttendeeUpdate {
    let id = match attendee.id.as_deref() {
        Some(id) => id.to_string(),
        None => {
            tracing::warn!(
                action,
                "Attendee payload has no id, storing under {}",
                UNKNOWN_ATTENDEE_ID
            );
            UNKNOWN_ATTENDEE_ID.to_string()
        }
    };

    let status = AttendeeStatus::from_token(attendee.status.as_deref().unwrap_or(action));
    let checked_in = attendee.checked_in.or_else(|| status.implied_checked_in());

    AttendeeUpdate {
        id,
        name: attendee.display_name().map(str::to_string),
        email: attendee.email().map(str::to_string),
        status: Some(status),
        checked_in,
        answers: attendee.answers(),
        event_id: attendee.event_id.clone(),
    }
}

/// Map an attendee embedded in the notification.
///
/// Here the notification's action is the status, whatever the embedded
/// object says.
pub fn normalize_inline(attendee: &UpstreamAttendee, action: &str) -> AttendeeUpdate {
    let status = AttendeeStatus::from_token(action);
    let checked_in = status.implied_checked_in().or(attendee.checked_in);
    AttendeeUpdate {
        status: Some(status),
        checked_in,
        ..normalize_upstream(attendee, action)
    }
}

/// Fixed record for manual/test notifications.
pub fn placeholder_update(action: &str) -> AttendeeUpdate {
    let status = AttendeeStatus::from_token(action);
    let checked_in = status.implied_checked_in();
    AttendeeUpdate {
        id: PLACEHOLDER_ATTENDEE_ID.to_string(),
        name: Some(PLACEHOLDER_NAME.to_string()),
        email: Some(PLACEHOLDER_EMAIL.to_string()),
        status: Some(status),
        checked_in,
        answers: None,
        event_id: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_classify_reference() {
        let payload = json!({
            "config": {"action": "attendee.updated", "webhook_id": "1"},
            "api_url": "https://www.eventbriteapi.com/v3/events/1/attendees/2/"
        });
        assert_eq!(
            Notification::classify(&payload),
            Notification::Reference {
                action: "attendee.updated".to_string(),
                api_url: "https://www.eventbriteapi.com/v3/events/1/attendees/2/".to_string(),
            }
        );
    }

    #[test]
    fn test_classify_reference_defaults_action() {
        let payload = json!({"api_url": "https://www.eventbriteapi.com/v3/x/"});
        match Notification::classify(&payload) {
            Notification::Reference { action, .. } => assert_eq!(action, DEFAULT_ACTION),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_classify_manual() {
        let payload = json!({"config": {"action": "check_in"}});
        assert_eq!(
            Notification::classify(&payload),
            Notification::Manual {
                action: "check_in".to_string()
            }
        );
    }

    #[test]
    fn test_classify_inline() {
        let payload = json!({
            "config": {"action": "checked_out"},
            "api_url_object": {"id": "a9", "name": "Ann"}
        });
        assert_eq!(Notification::classify(&payload).kind(), "inline");
    }

    #[test]
    fn test_classify_malformed() {
        assert_eq!(Notification::classify(&json!({})), Notification::Malformed);
        assert_eq!(
            Notification::classify(&json!({"config": {}, "api_url": ""})),
            Notification::Malformed
        );
        assert_eq!(
            Notification::classify(&json!({"api_url_object": {"name": "no id"}})),
            Notification::Malformed
        );
        assert_eq!(Notification::classify(&json!([1, 2])), Notification::Malformed);
    }

    #[test]
    fn test_normalize_upstream_prefers_resource_status() {
        let attendee: UpstreamAttendee = serde_json::from_value(json!({
            "id": "a1",
            "status": "Checked In",
            "profile": {"name": "Ann", "email": "ann@example.com"},
            "event_id": "e1"
        }))
        .unwrap();

        let update = normalize_upstream(&attendee, "attendee.updated");
        assert_eq!(update.id, "a1");
        assert_eq!(update.name.as_deref(), Some("Ann"));
        assert_eq!(update.email.as_deref(), Some("ann@example.com"));
        assert_eq!(update.status, Some(AttendeeStatus::CheckedIn));
        assert_eq!(update.checked_in, Some(true));
        assert_eq!(update.event_id.as_deref(), Some("e1"));
    }

    #[test]
    fn test_normalize_upstream_defaults() {
        let update = normalize_upstream(&UpstreamAttendee::default(), "checked_out");
        assert_eq!(update.id, UNKNOWN_ATTENDEE_ID);
        assert_eq!(update.name, None);
        assert_eq!(update.email, None);
        assert_eq!(update.status, Some(AttendeeStatus::CheckedOut));
        assert_eq!(update.checked_in, Some(false));
    }

    #[test]
    fn test_placeholder_keeps_action_as_status() {
        let update = placeholder_update("check_in");
        assert_eq!(update.id, PLACEHOLDER_ATTENDEE_ID);
        assert_eq!(
            update.status,
            Some(AttendeeStatus::Other("check_in".to_string()))
        );
        assert_eq!(update.checked_in, None);
    }

    #[test]
    fn test_normalize_inline_uses_action_as_status() {
        let attendee: UpstreamAttendee = serde_json::from_value(json!({
            "id": "a1",
            "name": "Ann",
            "status": "Attending",
            "checked_in": true
        }))
        .unwrap();

        let update = normalize_inline(&attendee, "checked_out");
        assert_eq!(update.status, Some(AttendeeStatus::CheckedOut));
        assert_eq!(update.checked_in, Some(false));
        assert_eq!(update.name.as_deref(), Some("Ann"));

        let update = normalize_inline(&attendee, "attendee.updated");
        assert_eq!(
            update.status,
            Some(AttendeeStatus::Other("attendee.updated".to_string()))
        );
        assert_eq!(update.checked_in, Some(true));
    }
}
