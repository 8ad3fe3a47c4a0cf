// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Attendee repository: the local mirror of Eventbrite attendees.
//!
//! Every mutation is an upsert-by-id. Upserts to the same attendee are
//! serialized with a per-id async mutex (read, merge, write happen under it);
//! upserts to different attendees never contend.

use crate::db::Database;
use crate::error::{AppError, Result};
use crate::models::{Attendee, AttendeeField, AttendeeUpdate};
use crate::time_utils::next_update_timestamp;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Per-attendee write locks, created on demand and dropped when idle.
type KeyLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

#[derive(Clone)]
pub struct AttendeeRepository {
    db: Database,
    locks: KeyLocks,
}

impl AttendeeRepository {
    pub fn new(db: Database) -> Self {
        Self {
            db,
            locks: Arc::new(DashMap::new()),
        }
    }

    /// Insert `update` as a new record, or merge the listed `fields` it
    /// carries into the existing record.
    ///
    /// `updated_at` is refreshed on every call, so it strictly increases per
    /// attendee. Returns the record as stored.
    pub async fn upsert(&self, update: &AttendeeUpdate, fields: &[AttendeeField]) -> Result<Attendee> {
        if update.id.is_empty() {
            return Err(AppError::BadRequest("Attendee ID is empty".to_string()));
        }

        let lock = self
            .locks
            .entry(update.id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let result = {
            let _guard = lock.lock().await;
            self.read_merge_write(update, fields).await
        };

        drop(lock);
        // Only the map holds the lock now unless another upsert is waiting on it.
        self.locks
            .remove_if(&update.id, |_, lock| Arc::strong_count(lock) == 1);

        result
    }

    async fn read_merge_write(
        &self,
        update: &AttendeeUpdate,
        fields: &[AttendeeField],
    ) -> Result<Attendee> {
        let stored = match self.db.get_attendee(&update.id).await? {
            Some(mut existing) => {
                update.merge_into(&mut existing, fields);
                existing.updated_at = next_update_timestamp(Some(existing.updated_at));
                existing
            }
            None => {
                tracing::debug!(attendee_id = %update.id, "First sighting of attendee");
                update.to_new_attendee(next_update_timestamp(None))
            }
        };

        self.db.set_attendee(&stored).await?;
        Ok(stored)
    }

    /// Snapshot of every stored attendee.
    pub async fn get_all(&self) -> Result<Vec<Attendee>> {
        self.db.list_attendees().await
    }

    pub async fn get_by_id(&self, attendee_id: &str) -> Result<Option<Attendee>> {
        self.db.get_attendee(attendee_id).await
    }

    /// Number of per-id locks currently held or awaited.
    pub fn active_locks(&self) -> usize {
        self.locks.len()
    }
}
