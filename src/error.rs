// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// No Eventbrite credential has been stored yet.
    #[error("Authentication required: no Eventbrite credential is active")]
    Unauthenticated,

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Eventbrite rejected the credential (401/403).
    #[error("Eventbrite rejected credentials: {0}")]
    UpstreamAuth(String),

    /// Eventbrite was unreachable or answered with a non-auth failure.
    #[error("Eventbrite API unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Attendee or credential storage failed.
    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// True when the upstream API refused our credential and the user must
    /// re-authorize.
    pub fn is_upstream_auth_error(&self) -> bool {
        matches!(self, AppError::UpstreamAuth(_))
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::Unauthenticated => (
                StatusCode::BAD_REQUEST,
                "unauthenticated",
                Some("Connect an Eventbrite account first".to_string()),
            ),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::UpstreamAuth(msg) => {
                tracing::warn!(error = %msg, "Eventbrite rejected credentials");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "upstream_auth_error",
                    Some(msg.clone()),
                )
            }
            AppError::UpstreamUnavailable(msg) => {
                tracing::error!(error = %msg, "Eventbrite API unavailable");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "upstream_unavailable",
                    Some(msg.clone()),
                )
            }
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "repository_unavailable",
                    Some("Attendee storage is unavailable".to_string()),
                )
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
