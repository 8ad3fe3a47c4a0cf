//! Database layer (Firestore, or in-memory for local runs and tests).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryDb;

use crate::config::StorageBackend;
use crate::error::AppError;
use crate::models::{Attendee, Credential};

/// Collection names as constants.
pub mod collections {
    pub const TOKENS: &str = "tokens";
    pub const ATTENDEES: &str = "attendees";
}

/// Storage backend handle shared by the credential store and the attendee
/// repository.
#[derive(Clone)]
pub enum Database {
    Firestore(FirestoreDb),
    Memory(MemoryDb),
}

impl Database {
    /// Open the backend selected in configuration.
    pub async fn connect(storage: &StorageBackend) -> Result<Self, AppError> {
        match storage {
            StorageBackend::Firestore { project_id } => {
                Ok(Database::Firestore(FirestoreDb::new(project_id).await?))
            }
            StorageBackend::Memory => {
                tracing::warn!(
                    "Using in-memory storage: a restart drops the Eventbrite credential \
                     and the attendee mirror until re-authorization"
                );
                Ok(Database::Memory(MemoryDb::new()))
            }
        }
    }

    pub fn in_memory() -> Self {
        Database::Memory(MemoryDb::new())
    }

    pub async fn get_credential(&self) -> Result<Option<Credential>, AppError> {
        match self {
            Database::Firestore(db) => db.get_credential().await,
            Database::Memory(db) => Ok(db.get_credential()),
        }
    }

    pub async fn set_credential(&self, credential: &Credential) -> Result<(), AppError> {
        match self {
            Database::Firestore(db) => db.set_credential(credential).await,
            Database::Memory(db) => {
                db.set_credential(credential);
                Ok(())
            }
        }
    }

    pub async fn get_attendee(&self, attendee_id: &str) -> Result<Option<Attendee>, AppError> {
        match self {
            Database::Firestore(db) => db.get_attendee(attendee_id).await,
            Database::Memory(db) => Ok(db.get_attendee(attendee_id)),
        }
    }

    pub async fn set_attendee(&self, attendee: &Attendee) -> Result<(), AppError> {
        match self {
            Database::Firestore(db) => db.set_attendee(attendee).await,
            Database::Memory(db) => {
                db.set_attendee(attendee);
                Ok(())
            }
        }
    }

    pub async fn list_attendees(&self) -> Result<Vec<Attendee>, AppError> {
        match self {
            Database::Firestore(db) => db.list_attendees().await,
            Database::Memory(db) => Ok(db.list_attendees()),
        }
    }
}
