//! Process-local storage backend.
//!
//! Nothing here survives a restart: after one, the integration stays
//! unauthenticated until the organizer re-authorizes.

use crate::models::{Attendee, Credential};
use dashmap::DashMap;
use std::sync::{Arc, RwLock};

/// In-memory database, cheap to clone (shared state).
#[derive(Clone, Default)]
pub struct MemoryDb {
    credential: Arc<RwLock<Option<Credential>>>,
    attendees: Arc<DashMap<String, Attendee>>,
}

impl MemoryDb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_credential(&self) -> Option<Credential> {
        match self.credential.read() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set_credential(&self, credential: &Credential) {
        let mut slot = match self.credential.write() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        *slot = Some(credential.clone());
    }

    pub fn get_attendee(&self, attendee_id: &str) -> Option<Attendee> {
        self.attendees.get(attendee_id).map(|a| a.clone())
    }

    pub fn set_attendee(&self, attendee: &Attendee) {
        self.attendees.insert(attendee.id.clone(), attendee.clone());
    }

    /// Snapshot sorted by ID so repeated reads are stable.
    pub fn list_attendees(&self) -> Vec<Attendee> {
        let mut all: Vec<Attendee> = self.attendees.iter().map(|e| e.value().clone()).collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }
}
