// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge selection policy and per-event eligibility criteria.

use chrono::NaiveDateTime;
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;
use crate::models::challenge::{Challenge, ChallengeStatus};
use crate::models::event::WorkoutEvent;

/// Which challenges an event may advance, and how status is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// `current` challenges whose `[start_date, end_date]` contains the
    /// event's local timestamp. Status is rewritten on every update.
    #[default]
    TimeWindow,
    /// Superseded schema: every `active` challenge, no window. Status is
    /// written only when the challenge completes.
    StatusOnly,
}

impl MatchPolicy {
    /// Status label a challenge must carry to be eligible.
    pub fn eligible_status(&self) -> ChallengeStatus {
        match self {
            MatchPolicy::TimeWindow => ChallengeStatus::Current,
            MatchPolicy::StatusOnly => ChallengeStatus::Active,
        }
    }

    pub fn requires_timestamp(&self) -> bool {
        matches!(self, MatchPolicy::TimeWindow)
    }

    /// Status to write alongside the increment; `None` leaves it untouched.
    pub fn status_after(&self, is_complete: bool) -> Option<ChallengeStatus> {
        match (self, is_complete) {
            (_, true) => Some(ChallengeStatus::Completed),
            (MatchPolicy::TimeWindow, false) => Some(ChallengeStatus::Current),
            (MatchPolicy::StatusOnly, false) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MatchPolicy::TimeWindow => "window",
            MatchPolicy::StatusOnly => "status",
        }
    }
}

impl fmt::Display for MatchPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "window" | "time-window" | "time_window" => Ok(MatchPolicy::TimeWindow),
            "status" | "status-only" | "status_only" => Ok(MatchPolicy::StatusOnly),
            other => Err(format!("unknown challenge policy: {}", other)),
        }
    }
}

/// Criteria the matcher hands to storage for one event.
///
/// Storage filters on `user_id` and `status`; the window is checked in
/// process by [`Eligibility::admits`].
#[derive(Debug, Clone, PartialEq)]
pub struct Eligibility {
    pub user_id: String,
    pub status: ChallengeStatus,
    pub at: Option<NaiveDateTime>,
}

impl Eligibility {
    /// Build criteria for an event under `policy`.
    ///
    /// Fails when the policy needs a timestamp the event does not carry.
    pub fn for_event(event: &WorkoutEvent, policy: MatchPolicy) -> Result<Self, AppError> {
        let at = match (policy.requires_timestamp(), event.timestamp_local) {
            (true, None) => {
                return Err(AppError::InvalidEvent(
                    "missing detail.timestamp_local".to_string(),
                ))
            }
            (true, Some(ts)) => Some(ts),
            (false, _) => None,
        };

        Ok(Self {
            user_id: event.user_id.clone(),
            status: policy.eligible_status(),
            at,
        })
    }

    /// Whether a stored challenge satisfies these criteria.
    pub fn admits(&self, challenge: &Challenge) -> bool {
        if challenge.user_id != self.user_id || challenge.status != self.status {
            return false;
        }

        let Some(at) = self.at else {
            return true;
        };

        match challenge.window_contains(at) {
            Ok(inside) => inside,
            Err(e) => {
                tracing::warn!(
                    user_id = %challenge.user_id,
                    challenge_id = %challenge.challenge_id,
                    error = %e,
                    "Skipping challenge with unreadable window"
                );
                false
            }
        }
    }
}
