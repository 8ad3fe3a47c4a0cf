// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Integration tests for webhook handling.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use checkin_sync::config::Config;
use checkin_sync::models::AttendeeStatus;
use serde_json::json;
use tower::ServiceExt;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;
use common::{
    assert_no_frame, body_json, config_for, create_test_app, json_request, next_frame, subscribe,
};

#[tokio::test]
async fn test_manual_notification_stores_and_broadcasts_placeholder() {
    let (app, state) = create_test_app(Config::default(), None).await;
    let mut subscription = subscribe(&state).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/webhook",
            json!({"config": {"action": "check_in"}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"received": true}));

    let frame = next_frame(&mut subscription).await.expect("attendee frame");
    assert_eq!(frame["type"], "attendee_updated");
    assert_eq!(frame["attendee"]["id"], "test_attendee");
    assert_eq!(frame["attendee"]["name"], "Test Attendee");
    assert_eq!(frame["attendee"]["email"], "test@example.com");
    assert_eq!(frame["attendee"]["status"], "check_in");

    let stored = state
        .attendees
        .get_by_id("test_attendee")
        .await
        .unwrap()
        .expect("placeholder stored");
    assert_eq!(stored.status, AttendeeStatus::Other("check_in".to_string()));
}

#[tokio::test]
async fn test_malformed_notification_is_acknowledged_and_ignored() {
    let (app, state) = create_test_app(Config::default(), None).await;
    let mut subscription = subscribe(&state).await;

    let response = app
        .oneshot(json_request("POST", "/webhook", json!({"foo": "bar"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["received"], true);

    assert_no_frame(&mut subscription).await;
    assert!(state.attendees.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_non_json_body_is_acknowledged() {
    let (app, state) = create_test_app(Config::default(), None).await;

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/webhook")
                .header("Content-Type", "text/plain")
                .body(Body::from("definitely not json"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["received"], true);
    assert!(state.attendees.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reference_notification_hydrates_attendee() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/events/e1/attendees/a42/"))
        .and(header("authorization", "Bearer live-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "a42",
            "status": "Checked In",
            "checked_in": true,
            "event_id": "e1",
            "profile": {"name": "Grace Hopper", "email": "grace@example.com"},
            "answers": [{"question": "Team", "answer": "Navy"}]
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let (app, state) = create_test_app(config_for(&upstream.uri()), Some("live-token")).await;
    let mut subscription = subscribe(&state).await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/webhook",
            json!({
                "config": {"action": "attendee.checked_in", "webhook_id": "9"},
                "api_url": format!("{}/v3/events/e1/attendees/a42/", upstream.uri())
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let frame = next_frame(&mut subscription).await.expect("attendee frame");
    assert_eq!(frame["attendee"]["id"], "a42");
    assert_eq!(frame["attendee"]["name"], "Grace Hopper");
    assert_eq!(frame["attendee"]["checked_in"], true);

    let stored = state.attendees.get_by_id("a42").await.unwrap().unwrap();
    assert_eq!(stored.status, AttendeeStatus::CheckedIn);
    assert_eq!(stored.email.as_deref(), Some("grace@example.com"));
    assert_eq!(stored.event_id.as_deref(), Some("e1"));
    assert_eq!(stored.answers.len(), 1);
}

#[tokio::test]
async fn test_reference_without_credential_makes_no_upstream_call() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "a1"})))
        .expect(0)
        .mount(&upstream)
        .await;

    let (_app, state) = create_test_app(config_for(&upstream.uri()), None).await;
    let mut subscription = subscribe(&state).await;

    let result = state
        .webhooks
        .process(json!({
            "config": {"action": "attendee.updated"},
            "api_url": format!("{}/v3/events/e1/attendees/a1/", upstream.uri())
        }))
        .await;

    assert!(matches!(
        result,
        Err(checkin_sync::error::AppError::Unauthenticated)
    ));
    assert_no_frame(&mut subscription).await;
    assert!(state.attendees.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_reference_outside_api_is_dropped() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "a1"})))
        .expect(0)
        .mount(&upstream)
        .await;

    let (_app, state) = create_test_app(config_for(&upstream.uri()), Some("live-token")).await;

    // Same host, but not under the API base path.
    let result = state
        .webhooks
        .process(json!({
            "config": {"action": "attendee.updated"},
            "api_url": format!("{}/elsewhere/a1/", upstream.uri())
        }))
        .await
        .unwrap();

    assert!(result.is_none());
    assert!(state.attendees.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_hydration_failure_writes_nothing() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401).set_body_string("INVALID_AUTH"))
        .expect(1)
        .mount(&upstream)
        .await;

    let (_app, state) = create_test_app(config_for(&upstream.uri()), Some("revoked")).await;
    let mut subscription = subscribe(&state).await;

    let err = state
        .webhooks
        .process(json!({
            "api_url": format!("{}/v3/events/e1/attendees/a1/", upstream.uri())
        }))
        .await
        .unwrap_err();

    assert!(err.is_upstream_auth_error());
    assert_no_frame(&mut subscription).await;
    assert!(state.attendees.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_inline_notification_uses_embedded_attendee() {
    let (_app, state) = create_test_app(Config::default(), None).await;
    let mut subscription = subscribe(&state).await;

    let stored = state
        .webhooks
        .process(json!({
            "config": {"action": "checked_out"},
            "api_url_object": {"id": 7, "name": "Inline Ann"}
        }))
        .await
        .unwrap()
        .expect("inline attendee stored");

    assert_eq!(stored.id, "7");
    assert_eq!(stored.name, "Inline Ann");
    assert_eq!(stored.status, AttendeeStatus::CheckedOut);
    assert!(!stored.checked_in);

    let frame = next_frame(&mut subscription).await.unwrap();
    assert_eq!(frame["attendee"]["id"], "7");
}

#[tokio::test]
async fn test_inline_notification_status_comes_from_action() {
    let (_app, state) = create_test_app(Config::default(), None).await;

    let stored = state
        .webhooks
        .process(json!({
            "config": {"action": "checked_out"},
            "api_url_object": {"id": "a1", "name": "Ann", "status": "Attending"}
        }))
        .await
        .unwrap()
        .expect("inline attendee stored");

    assert_eq!(stored.status, AttendeeStatus::CheckedOut);
    assert!(!stored.checked_in);
    let persisted = state.attendees.get_by_id("a1").await.unwrap().unwrap();
    assert_eq!(persisted.status, AttendeeStatus::CheckedOut);
}

#[tokio::test]
async fn test_hydrated_attendee_without_name_keeps_stored_name() {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v3/events/e1/attendees/a1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "a1",
            "status": "Checked In"
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let (_app, state) = create_test_app(config_for(&upstream.uri()), Some("live-token")).await;
    state
        .reconciler
        .ingest_roster(
            "e1",
            &[json!({"id": "a1", "profile": {"name": "Ada", "email": "ada@example.com"}})],
        )
        .await
        .unwrap();

    let stored = state
        .webhooks
        .process(json!({
            "config": {"action": "attendee.checked_in"},
            "api_url": format!("{}/v3/events/e1/attendees/a1/", upstream.uri())
        }))
        .await
        .unwrap()
        .expect("hydrated attendee stored");

    assert_eq!(stored.name, "Ada");
    assert_eq!(stored.email.as_deref(), Some("ada@example.com"));
    assert_eq!(stored.status, AttendeeStatus::CheckedIn);
}

#[tokio::test]
async fn test_first_sighting_without_name_is_unknown() {
    let (_app, state) = create_test_app(Config::default(), None).await;

    let stored = state
        .webhooks
        .process(json!({
            "config": {"action": "checked_in"},
            "api_url_object": {"id": "nameless"}
        }))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(stored.name, "Unknown");
}

#[tokio::test]
async fn test_repeated_notification_converges() {
    let (_app, state) = create_test_app(Config::default(), None).await;
    let payload = json!({"config": {"action": "checked_in"}});

    let first = state.webhooks.process(payload.clone()).await.unwrap().unwrap();
    let second = state.webhooks.process(payload).await.unwrap().unwrap();

    assert_eq!(first.id, second.id);
    assert_eq!(first.status, second.status);
    assert_eq!(first.created_at, second.created_at);
    assert!(second.updated_at > first.updated_at);
    assert_eq!(state.attendees.get_all().await.unwrap().len(), 1);
}
