// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Result envelope returned for every processed event.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::event::INVALID_EVENT_MESSAGE;

pub const SUCCESS_MESSAGE: &str = "Challenges updated successfully.";
pub const NOT_FOUND_MESSAGE: &str = "No eligible challenges found for the user.";
pub const INTERNAL_ERROR_MESSAGE: &str = "Failed to update challenges due to an internal error.";

/// Response body: exactly one of `message` or `error` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ResponseBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// `{ statusCode, body }` envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub status_code: u16,
    pub body: ResponseBody,
}

impl EventResponse {
    pub fn updated() -> Self {
        Self::message(StatusCode::OK, SUCCESS_MESSAGE)
    }

    pub fn no_eligible_challenges() -> Self {
        Self::message(StatusCode::NOT_FOUND, NOT_FOUND_MESSAGE)
    }

    fn message(status: StatusCode, message: &str) -> Self {
        Self {
            status_code: status.as_u16(),
            body: ResponseBody {
                message: Some(message.to_string()),
                ..Default::default()
            },
        }
    }

    fn error(status: StatusCode, error: &str, details: Option<String>) -> Self {
        Self {
            status_code: status.as_u16(),
            body: ResponseBody {
                error: Some(error.to_string()),
                details,
                ..Default::default()
            },
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<&AppError> for EventResponse {
    fn from(err: &AppError) -> Self {
        match err {
            AppError::InvalidEvent(detail) => Self::error(
                StatusCode::BAD_REQUEST,
                INVALID_EVENT_MESSAGE,
                Some(detail.clone()),
            ),
            AppError::NotFound(_) => Self::no_eligible_challenges(),
            AppError::Forbidden(detail) => {
                Self::error(StatusCode::FORBIDDEN, "Forbidden", Some(detail.clone()))
            }
            // Storage details stay in the logs.
            AppError::Database(_) | AppError::Internal(_) => {
                Self::error(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE, None)
            }
        }
    }
}

impl IntoResponse for EventResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body)).into_response()
    }
}
