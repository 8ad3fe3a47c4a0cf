// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides plain document reads and writes for:
//! - Tokens (the single active Eventbrite credential)
//! - Attendees (local mirror keyed by Eventbrite attendee ID)
//!
//! Merge semantics and per-attendee serialization live in
//! `services::attendees`; this layer always writes whole documents.

use crate::db::collections;
use crate::error::AppError;
use crate::models::{Attendee, Credential};

/// Document ID of the active credential inside `tokens`.
const ACTIVE_CREDENTIAL_DOC: &str = "active";

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::connect_emulator(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Connect to the emulator with a dummy bearer token so no local
    /// credentials are picked up.
    async fn connect_emulator(project_id: &str) -> Result<Self, AppError> {
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJjaGVja2luIn0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let client = firestore::FirestoreDb::with_options_token_source(
            firestore::FirestoreDbOptions::new(project_id.to_string()),
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(project = project_id, "Connected to Firestore emulator");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client for testing.
    ///
    /// Every operation fails with `AppError::Database`.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Credential Operations ──────────────────────────────────

    /// Get the active credential, if one was ever stored.
    pub async fn get_credential(&self) -> Result<Option<Credential>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::TOKENS)
            .obj()
            .one(ACTIVE_CREDENTIAL_DOC)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Replace the active credential.
    ///
    /// A single-document write, so readers observe either the old or the new
    /// credential.
    pub async fn set_credential(&self, credential: &Credential) -> Result<(), AppError> {
        let _: Credential = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::TOKENS)
            .document_id(ACTIVE_CREDENTIAL_DOC)
            .object(credential)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Attendee Operations ────────────────────────────────────

    /// Get an attendee by Eventbrite ID.
    pub async fn get_attendee(&self, attendee_id: &str) -> Result<Option<Attendee>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ATTENDEES)
            .obj()
            .one(attendee_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Write a whole attendee document.
    pub async fn set_attendee(&self, attendee: &Attendee) -> Result<(), AppError> {
        let _: Attendee = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ATTENDEES)
            .document_id(&attendee.id)
            .object(attendee)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All stored attendees, ordered by document ID.
    pub async fn list_attendees(&self) -> Result<Vec<Attendee>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ATTENDEES)
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }
}
