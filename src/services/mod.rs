// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod attendees;
pub mod broadcast;
pub mod credentials;
pub mod eventbrite;
pub mod normalizer;
pub mod reconcile;
pub mod webhook;

pub use attendees::AttendeeRepository;
pub use broadcast::{Broadcaster, ChannelState, Subscription};
pub use credentials::CredentialStore;
pub use eventbrite::{EventbriteClient, EventbriteService};
pub use normalizer::{Normalizer, Notification};
pub use reconcile::Reconciler;
pub use webhook::WebhookProcessor;
