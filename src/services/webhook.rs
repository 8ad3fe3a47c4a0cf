// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Background processing of acknowledged webhook notifications.
//!
//! The HTTP handler acknowledges first and hands the payload to
//! [`WebhookProcessor::spawn`]. From there a notification is normalized,
//! reconciled and broadcast; any failure ends that notification and is only
//! visible in the logs. There is no retry.

use crate::error::{AppError, Result};
use crate::models::Attendee;
use crate::services::normalizer::{Normalizer, Notification};
use crate::services::reconcile::Reconciler;
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::Instrument;

#[derive(Clone)]
pub struct WebhookProcessor {
    normalizer: Normalizer,
    reconciler: Reconciler,
}

impl WebhookProcessor {
    pub fn new(normalizer: Normalizer, reconciler: Reconciler) -> Self {
        Self {
            normalizer,
            reconciler,
        }
    }

    /// Process `payload` on a background task.
    pub fn spawn(&self, payload: Value) -> JoinHandle<()> {
        let processor = self.clone();
        tokio::spawn(
            async move {
                processor.process_logged(payload).await;
            }
            .instrument(tracing::info_span!("webhook")),
        )
    }

    /// Normalize and reconcile one notification.
    ///
    /// `Ok(None)` when the notification was ignored.
    pub async fn process(&self, payload: Value) -> Result<Option<Attendee>> {
        let notification = Notification::classify(&payload);
        tracing::info!(kind = notification.kind(), "Webhook notification classified");

        let Some(update) = self.normalizer.normalize(notification).await? else {
            return Ok(None);
        };

        self.reconciler.reconcile(&update).await.map(Some)
    }

    async fn process_logged(&self, payload: Value) {
        match self.process(payload).await {
            Ok(Some(attendee)) => {
                tracing::debug!(attendee_id = %attendee.id, "Webhook notification applied");
            }
            Ok(None) => {}
            Err(AppError::Unauthenticated) => {
                tracing::warn!("Dropping webhook notification: no Eventbrite credential");
            }
            Err(e @ AppError::Database(_)) => {
                tracing::error!(error = %e, "Dropping webhook notification: attendee storage failed");
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    reauthorize = e.is_upstream_auth_error(),
                    "Dropping webhook notification: hydration failed"
                );
            }
        }
    }
}
