// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Distance challenge model for storage.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::time_utils::{parse_window_end, parse_window_start};

/// Challenge lifecycle label as stored.
///
/// `Active` is the label written by the older status-only schema; newer
/// records use `Current`. Both move forward to `Completed` and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeStatus {
    Active,
    Current,
    Completed,
}

impl ChallengeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeStatus::Active => "active",
            ChallengeStatus::Current => "current",
            ChallengeStatus::Completed => "completed",
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ChallengeStatus::Completed)
    }
}

impl fmt::Display for ChallengeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored challenge record.
///
/// Keyed by `(user_id, challenge_id)`. Only `completed_meters` and `status`
/// are ever written by this service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Challenge {
    /// Owner (partition key)
    pub user_id: String,
    /// Unique per user (sort key)
    pub challenge_id: String,
    pub status: ChallengeStatus,
    /// Distance goal in meters
    pub target_meters: f64,
    /// Running total in meters; may exceed the target
    #[serde(default)]
    pub completed_meters: f64,
    /// Inclusive window start (local time or date)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,
    /// Inclusive window end (local time or date)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
}

/// Why a challenge window could not be evaluated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unparseable {field}: {value:?}")]
pub struct WindowError {
    pub field: &'static str,
    pub value: String,
}

impl Challenge {
    /// Check whether `at` falls inside `[start_date, end_date]`.
    ///
    /// A missing bound is open on that side.
    pub fn window_contains(&self, at: NaiveDateTime) -> Result<bool, WindowError> {
        if let Some(start) = &self.start_date {
            let start = parse_window_start(start).ok_or_else(|| WindowError {
                field: "start_date",
                value: start.clone(),
            })?;
            if at < start {
                return Ok(false);
            }
        }

        if let Some(end) = &self.end_date {
            let end = parse_window_end(end).ok_or_else(|| WindowError {
                field: "end_date",
                value: end.clone(),
            })?;
            if at > end {
                return Ok(false);
            }
        }

        Ok(true)
    }
}
