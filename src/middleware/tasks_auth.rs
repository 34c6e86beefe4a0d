// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cloud Tasks queue check for `/tasks/*` routes.

use crate::config::QUEUE_NAME_HEADER;
use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

/// Require the configured queue name on task deliveries.
///
/// With no queue configured every request passes.
pub async fn require_queue_header(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config.event_queue_name.as_deref() else {
        return Ok(next.run(request).await);
    };

    let queue_name_header = request.headers().get(QUEUE_NAME_HEADER);
    let is_valid_queue = queue_name_header
        .and_then(|h| h.to_str().ok())
        .map(|name| name == expected)
        .unwrap_or(false);

    if !is_valid_queue {
        tracing::warn!(
            header = ?queue_name_header,
            "Blocked tasks request with invalid queue header"
        );
        return Err(AppError::Forbidden(
            "request did not come from the event queue".to_string(),
        ));
    }

    Ok(next.run(request).await)
}
