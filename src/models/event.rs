// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Workout event envelope and normalization.
//!
//! Inbound events look like:
//!
//! ```json
//! { "id": "...", "detail": { "user_id": "u1", "distance_in_meters": 1500,
//!                            "timestamp_local": "2024-05-01T07:30:00",
//!                            "activity_type": "Run" } }
//! ```
//!
//! Decoding fails closed: a missing `detail`, `user_id` or
//! `distance_in_meters` is rejected, as is any field of the wrong type.

use chrono::NaiveDateTime;
use serde::Deserialize;

use crate::error::AppError;
use crate::time_utils::{from_unix_seconds, parse_local_timestamp};

/// Message returned to the caller for any rejected envelope.
pub const INVALID_EVENT_MESSAGE: &str =
    "Invalid event structure. Must include event.detail with user_id and distance_in_meters.";

#[derive(Debug, Deserialize)]
struct EventEnvelope {
    #[serde(default)]
    id: Option<serde_json::Value>,
    #[serde(default)]
    detail: Option<WorkoutDetail>,
}

#[derive(Debug, Deserialize)]
struct WorkoutDetail {
    #[serde(default)]
    user_id: Option<String>,
    #[serde(default)]
    distance_in_meters: Option<f64>,
    #[serde(default)]
    timestamp_local: Option<TimestampValue>,
    #[serde(default)]
    activity_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TimestampValue {
    Text(String),
    EpochSeconds(f64),
}

impl TimestampValue {
    fn to_naive(&self) -> Option<NaiveDateTime> {
        match self {
            TimestampValue::Text(s) => parse_local_timestamp(s),
            TimestampValue::EpochSeconds(secs) => from_unix_seconds(*secs),
        }
    }
}

/// A validated workout event.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutEvent {
    /// Envelope id, kept for log correlation only
    pub event_id: Option<String>,
    pub user_id: String,
    pub distance_in_meters: f64,
    pub timestamp_local: Option<NaiveDateTime>,
    pub activity_type: Option<String>,
}

impl WorkoutEvent {
    /// Normalize a raw JSON body.
    pub fn from_slice(body: &[u8]) -> Result<Self, AppError> {
        let envelope: EventEnvelope = serde_json::from_slice(body)
            .map_err(|e| AppError::InvalidEvent(format!("malformed envelope: {}", e)))?;
        Self::from_envelope(envelope)
    }

    /// Normalize an already-parsed JSON envelope.
    pub fn from_value(value: serde_json::Value) -> Result<Self, AppError> {
        let envelope: EventEnvelope = serde_json::from_value(value)
            .map_err(|e| AppError::InvalidEvent(format!("malformed envelope: {}", e)))?;
        Self::from_envelope(envelope)
    }

    fn from_envelope(envelope: EventEnvelope) -> Result<Self, AppError> {
        let detail = envelope
            .detail
            .ok_or_else(|| AppError::InvalidEvent("missing detail".to_string()))?;

        let user_id = detail
            .user_id
            .ok_or_else(|| AppError::InvalidEvent("missing detail.user_id".to_string()))?;
        if user_id.trim().is_empty() {
            return Err(AppError::InvalidEvent("empty detail.user_id".to_string()));
        }

        let distance_in_meters = detail.distance_in_meters.ok_or_else(|| {
            AppError::InvalidEvent("missing detail.distance_in_meters".to_string())
        })?;
        if !distance_in_meters.is_finite() || distance_in_meters < 0.0 {
            return Err(AppError::InvalidEvent(format!(
                "detail.distance_in_meters must be a non-negative number, got {}",
                distance_in_meters
            )));
        }

        let timestamp_local = match &detail.timestamp_local {
            Some(raw) => Some(raw.to_naive().ok_or_else(|| {
                AppError::InvalidEvent(format!("unparseable detail.timestamp_local: {:?}", raw))
            })?),
            None => None,
        };

        let event_id = envelope.id.and_then(|id| match id {
            serde_json::Value::String(s) => Some(s),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        });

        Ok(Self {
            event_id,
            user_id,
            distance_in_meters,
            timestamp_local,
            activity_type: detail.activity_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assert_invalid(value: serde_json::Value) {
        match WorkoutEvent::from_value(value.clone()) {
            Err(AppError::InvalidEvent(_)) => {}
            other => panic!("expected InvalidEvent for {}, got {:?}", value, other),
        }
    }

    #[test]
    fn test_minimal_event() {
        let event = WorkoutEvent::from_value(json!({
            "detail": { "user_id": "u1", "distance_in_meters": 1500 }
        }))
        .unwrap();

        assert_eq!(event.user_id, "u1");
        assert_eq!(event.distance_in_meters, 1500.0);
        assert_eq!(event.timestamp_local, None);
        assert_eq!(event.activity_type, None);
        assert_eq!(event.event_id, None);
    }

    #[test]
    fn test_full_event() {
        let event = WorkoutEvent::from_value(json!({
            "id": "evt-1",
            "detail": {
                "user_id": "u1",
                "distance_in_meters": 2500.5,
                "timestamp_local": "2024-05-01T07:30:00",
                "activity_type": "Run"
            }
        }))
        .unwrap();

        assert_eq!(event.event_id.as_deref(), Some("evt-1"));
        assert_eq!(event.distance_in_meters, 2500.5);
        assert_eq!(
            event.timestamp_local,
            parse_local_timestamp("2024-05-01T07:30:00")
        );
        assert_eq!(event.activity_type.as_deref(), Some("Run"));
    }

    #[test]
    fn test_zero_distance_is_valid() {
        let event = WorkoutEvent::from_value(json!({
            "detail": { "user_id": "u1", "distance_in_meters": 0 }
        }))
        .unwrap();
        assert_eq!(event.distance_in_meters, 0.0);
    }

    #[test]
    fn test_numeric_timestamp_is_epoch_seconds() {
        let event = WorkoutEvent::from_value(json!({
            "detail": {
                "user_id": "u1",
                "distance_in_meters": 10,
                "timestamp_local": 1714548600
            }
        }))
        .unwrap();
        assert_eq!(
            event.timestamp_local,
            parse_local_timestamp("2024-05-01T07:30:00")
        );
    }

    #[test]
    fn test_missing_fields_rejected() {
        assert_invalid(json!({}));
        assert_invalid(json!({ "detail": null }));
        assert_invalid(json!({ "detail": {} }));
        assert_invalid(json!({ "detail": { "distance_in_meters": 10 } }));
        assert_invalid(json!({ "detail": { "user_id": "u1" } }));
    }

    #[test]
    fn test_wrong_types_rejected() {
        assert_invalid(json!({ "detail": "u1" }));
        assert_invalid(json!({ "detail": { "user_id": "u1", "distance_in_meters": "10" } }));
        assert_invalid(json!({ "detail": { "user_id": 7, "distance_in_meters": 10 } }));
        assert_invalid(json!({
            "detail": { "user_id": "u1", "distance_in_meters": 10, "timestamp_local": "soon" }
        }));
    }

    #[test]
    fn test_negative_distance_rejected() {
        assert_invalid(json!({ "detail": { "user_id": "u1", "distance_in_meters": -1 } }));
    }

    #[test]
    fn test_blank_user_rejected() {
        assert_invalid(json!({ "detail": { "user_id": "  ", "distance_in_meters": 1 } }));
    }

    #[test]
    fn test_malformed_json_body_rejected() {
        assert!(matches!(
            WorkoutEvent::from_slice(b"{not json"),
            Err(AppError::InvalidEvent(_))
        ));
    }

    #[test]
    fn test_unknown_fields_ignored() {
        let event = WorkoutEvent::from_slice(
            br#"{"source":"fitness.app","detail-type":"WorkoutCompleted",
                "detail":{"user_id":"u1","distance_in_meters":5,"heart_rate":140}}"#,
        )
        .unwrap();
        assert_eq!(event.user_id, "u1");
    }
}
