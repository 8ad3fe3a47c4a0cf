// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Eventbrite OAuth routes.
//!
//! `GET /authorize` sends the organizer to Eventbrite with a signed `state`.
//! Eventbrite redirects to the app's callback page, which posts the code (and
//! the state, if it has one) to `POST /exchange_token`.

use axum::{extract::State, response::Redirect, routing::get, routing::post, Json, Router};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// How long a signed state stays valid.
const STATE_MAX_AGE_MS: u128 = 10 * 60 * 1000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/authorize", get(authorize))
        .route("/exchange_token", post(exchange_token))
}

/// Start OAuth flow - redirect to Eventbrite authorization.
async fn authorize(State(state): State<Arc<AppState>>) -> Result<Redirect> {
    let oauth_state = sign_state(now_millis()?, &state.config.oauth_state_key)?;
    let auth_url = state.eventbrite.client().authorize_url(&oauth_state);

    tracing::info!(
        client_id = %state.config.eventbrite_client_id,
        "Starting OAuth flow, redirecting to Eventbrite"
    );

    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct ExchangeTokenRequest {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
}

/// Exchange an authorization code, store the credential, return the raw
/// token payload.
async fn exchange_token(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ExchangeTokenRequest>,
) -> Result<Json<Value>> {
    let code = body
        .code
        .filter(|c| !c.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing code".to_string()))?;

    if let Some(oauth_state) = body.state.as_deref() {
        verify_state(oauth_state, &state.config.oauth_state_key, now_millis()?).ok_or_else(
            || {
                tracing::warn!("Invalid, expired or tampered OAuth state parameter");
                AppError::BadRequest("Invalid state".to_string())
            },
        )?;
    }

    tracing::info!("Exchanging authorization code for tokens");

    let raw = state.eventbrite.connect(code.trim()).await?;

    tracing::info!("OAuth successful, Eventbrite credential stored");
    Ok(Json(raw))
}

fn now_millis() -> Result<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis())
}

/// Build `base64url("timestamp_hex|signature_hex")`.
fn sign_state(timestamp_ms: u128, secret: &[u8]) -> Result<String> {
    let payload = format!("{:x}", timestamp_ms);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = mac.finalize().into_bytes();

    let signed = format!("{}|{}", payload, hex::encode(signature));
    Ok(URL_SAFE_NO_PAD.encode(signed.as_bytes()))
}

/// Check signature and age of an OAuth state. Returns its timestamp.
fn verify_state(state: &str, secret: &[u8], now_ms: u128) -> Option<u128> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    let (timestamp_hex, signature_hex) = state_str.split_once('|')?;
    let signature = hex::decode(signature_hex).ok()?;

    let mut mac = HmacSha256::new_from_slice(secret).ok()?;
    mac.update(timestamp_hex.as_bytes());
    let expected = mac.finalize().into_bytes();

    if !bool::from(expected.as_slice().ct_eq(signature.as_slice())) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    let timestamp = u128::from_str_radix(timestamp_hex, 16).ok()?;
    if now_ms.saturating_sub(timestamp) > STATE_MAX_AGE_MS || timestamp > now_ms + 60_000 {
        return None;
    }

    Some(timestamp)
}
