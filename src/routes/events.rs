// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout event routes.
//!
//! `/events/workout` takes events pushed directly; `/tasks/workout` takes the
//! same envelope delivered by Cloud Tasks and is guarded by the queue header
//! check. Both answer with the event's result envelope as the HTTP status
//! and JSON body.

use crate::middleware::require_queue_header;
use crate::models::EventResponse;
use crate::AppState;
use axum::{body::Bytes, extract::State, middleware, routing::post, Router};
use std::sync::Arc;

/// Event routes.
pub fn routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let tasks = Router::new()
        .route("/tasks/workout", post(workout_event))
        .route_layer(middleware::from_fn_with_state(state, require_queue_header));

    Router::new()
        .route("/events/workout", post(workout_event))
        .merge(tasks)
}

/// Apply one workout event.
async fn workout_event(State(state): State<Arc<AppState>>, body: Bytes) -> EventResponse {
    state.accumulator.handle_body(&body).await
}
