// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{Request, Response};
use checkin_sync::config::Config;
use checkin_sync::db::{Database, FirestoreDb};
use checkin_sync::routes::create_router;
use checkin_sync::services::{CredentialStore, Subscription};
use checkin_sync::AppState;
use std::sync::Arc;
use std::time::Duration;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline). Every operation fails.
#[allow(dead_code)]
pub fn test_db_offline() -> Database {
    Database::Firestore(FirestoreDb::new_mock())
}

/// Config pointing Eventbrite calls at `upstream` (a wiremock server URI).
#[allow(dead_code)]
pub fn config_for(upstream: &str) -> Config {
    Config {
        eventbrite_api_url: format!("{}/v3", upstream),
        eventbrite_oauth_url: format!("{}/oauth", upstream),
        ..Config::default()
    }
}

/// Create a test app on in-memory storage, optionally with a stored
/// credential. Returns the router and the shared state.
#[allow(dead_code)]
pub async fn create_test_app(
    config: Config,
    access_token: Option<&str>,
) -> (axum::Router, Arc<AppState>) {
    create_test_app_with_db(config, Database::in_memory(), access_token).await
}

#[allow(dead_code)]
pub async fn create_test_app_with_db(
    config: Config,
    db: Database,
    access_token: Option<&str>,
) -> (axum::Router, Arc<AppState>) {
    let credentials = CredentialStore::empty(Database::in_memory());
    if let Some(token) = access_token {
        credentials
            .set_credential(token.to_string(), None)
            .await
            .expect("store test credential");
    }

    let state = Arc::new(AppState::new(config, db, credentials).expect("build app state"));
    (create_router(state.clone()), state)
}

/// Register a live subscriber and consume its `connected` frame.
#[allow(dead_code)]
pub async fn subscribe(state: &AppState) -> Subscription {
    let mut subscription = state.broadcaster.register();
    let welcome = next_frame(&mut subscription)
        .await
        .expect("connected frame");
    assert_eq!(welcome["type"], "connected");
    subscription
}

/// Next frame for `subscription`, or `None` if nothing arrives in time.
#[allow(dead_code)]
pub async fn next_frame(subscription: &mut Subscription) -> Option<serde_json::Value> {
    let frame = tokio::time::timeout(Duration::from_secs(2), subscription.receiver.recv())
        .await
        .ok()??;
    Some(serde_json::from_str(&frame).expect("frame is JSON"))
}

/// True if nothing arrives for `subscription` within a short window.
#[allow(dead_code)]
pub async fn assert_no_frame(subscription: &mut Subscription) {
    let result =
        tokio::time::timeout(Duration::from_millis(200), subscription.receiver.recv()).await;
    assert!(result.is_err(), "unexpected frame: {:?}", result);
}

#[allow(dead_code)]
pub fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[allow(dead_code)]
pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[allow(dead_code)]
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let body = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}
