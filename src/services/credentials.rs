// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Single-slot store for the active Eventbrite credential.
//!
//! The credential is persisted through [`Database`] and mirrored in memory so
//! every outbound call can read it without I/O. Replacement persists first and
//! then swaps the in-memory slot, so readers see either the old or the new
//! credential in full.

use crate::db::Database;
use crate::error::AppError;
use crate::models::Credential;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// Shared handle to the active credential.
#[derive(Clone)]
pub struct CredentialStore {
    db: Database,
    active: Arc<RwLock<Option<Arc<Credential>>>>,
    /// Serializes replacements so the persisted and cached values agree.
    write_lock: Arc<Mutex<()>>,
}

impl CredentialStore {
    /// Create a store and prime it from the persisted credential, if any.
    pub async fn load(db: Database) -> Result<Self, AppError> {
        let persisted = db.get_credential().await?;
        if persisted.is_some() {
            tracing::info!("Restored persisted Eventbrite credential");
        } else {
            tracing::info!("No Eventbrite credential stored yet");
        }

        Ok(Self {
            db,
            active: Arc::new(RwLock::new(persisted.map(Arc::new))),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Create an empty store without reading the backend.
    pub fn empty(db: Database) -> Self {
        Self {
            db,
            active: Arc::new(RwLock::new(None)),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Replace the active credential.
    ///
    /// On a storage failure the previous credential stays active.
    pub async fn set_credential(
        &self,
        access_token: String,
        refresh_token: Option<String>,
    ) -> Result<Arc<Credential>, AppError> {
        let credential = Arc::new(Credential::new(access_token, refresh_token));

        let _guard = self.write_lock.lock().await;
        self.db.set_credential(&credential).await?;
        *self.active.write().await = Some(credential.clone());

        tracing::info!(
            has_refresh_token = credential.refresh_token.is_some(),
            "Eventbrite credential replaced"
        );
        Ok(credential)
    }

    /// The active credential, if any.
    pub async fn current(&self) -> Option<Arc<Credential>> {
        self.active.read().await.clone()
    }

    /// The active credential, or `Unauthenticated`.
    pub async fn require(&self) -> Result<Arc<Credential>, AppError> {
        self.current().await.ok_or(AppError::Unauthenticated)
    }
}
