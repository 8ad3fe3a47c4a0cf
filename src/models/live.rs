// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Messages pushed to live-update subscribers.

use crate::models::Attendee;
use serde::{Deserialize, Serialize};

/// JSON frame sent over the live channel, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LiveMessage {
    /// First frame on every channel, proves the channel is live.
    Connected {
        subscriber_id: u64,
        connected_at: String,
    },
    /// Attendee state after a webhook update was stored.
    AttendeeUpdated { attendee: Attendee },
}
