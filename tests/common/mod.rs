// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use challenge_progress::config::Config;
use challenge_progress::db::{FirestoreDb, MemoryStore};
use challenge_progress::models::{Challenge, ChallengeStatus, MatchPolicy};
use challenge_progress::routes::create_router;
use challenge_progress::services::ProgressAccumulator;
use challenge_progress::AppState;
use std::sync::Arc;
use tower::ServiceExt;

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

/// Build a challenge owned by `user_id`.
#[allow(dead_code)]
pub fn challenge(
    user_id: &str,
    challenge_id: &str,
    status: ChallengeStatus,
    completed_meters: f64,
    target_meters: f64,
) -> Challenge {
    Challenge {
        user_id: user_id.to_string(),
        challenge_id: challenge_id.to_string(),
        status,
        target_meters,
        completed_meters,
        start_date: None,
        end_date: None,
    }
}

/// Same as [`challenge`] with a `[start, end]` window.
#[allow(dead_code)]
pub fn windowed_challenge(
    user_id: &str,
    challenge_id: &str,
    completed_meters: f64,
    target_meters: f64,
    start: &str,
    end: &str,
) -> Challenge {
    Challenge {
        start_date: Some(start.to_string()),
        end_date: Some(end.to_string()),
        ..challenge(
            user_id,
            challenge_id,
            ChallengeStatus::Current,
            completed_meters,
            target_meters,
        )
    }
}

/// Create a test app over an in-memory store.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app(store: Arc<MemoryStore>, config: Config) -> (axum::Router, Arc<AppState>) {
    let accumulator = ProgressAccumulator::new(store, config.match_policy);
    let state = Arc::new(AppState {
        config,
        accumulator,
    });

    (create_router(state.clone()), state)
}

/// Test app with the default config and `policy`.
#[allow(dead_code)]
pub fn create_policy_app(store: Arc<MemoryStore>, policy: MatchPolicy) -> axum::Router {
    let config = Config {
        match_policy: policy,
        ..Config::test_default()
    };
    create_test_app(store, config).0
}

/// POST a raw body and return the status and parsed JSON body.
#[allow(dead_code)]
pub async fn post_raw(
    app: axum::Router,
    uri: &str,
    headers: &[(&str, &str)],
    body: impl Into<Body>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }

    let response = app
        .oneshot(builder.body(body.into()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

/// POST a JSON event to `/events/workout`.
#[allow(dead_code)]
pub async fn post_event(
    app: axum::Router,
    event: serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    post_raw(app, "/events/workout", &[], event.to_string()).await
}
