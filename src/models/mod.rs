// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod attendee;
pub mod credential;
pub mod live;

pub use attendee::{
    Answer, Attendee, AttendeeField, AttendeeStatus, AttendeeUpdate, ROSTER_MERGE_FIELDS,
    UNKNOWN_NAME, WEBHOOK_MERGE_FIELDS,
};
pub use credential::Credential;
pub use live::LiveMessage;
