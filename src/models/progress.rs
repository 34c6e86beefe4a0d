// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-challenge progress updates.
//!
//! An update carries only the distance to add and the policy it was planned
//! under. The status is decided by [`ProgressUpdate::apply_to`] against the
//! record as stored when the write happens, not as read by the matcher, so
//! overlapping events can never move a `completed` challenge backwards.

use serde::Serialize;

use crate::models::challenge::{Challenge, ChallengeStatus};
use crate::models::policy::MatchPolicy;

/// A planned write for one challenge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressUpdate {
    pub challenge_id: String,
    /// Meters to add at the storage layer
    pub delta: f64,
    #[serde(skip)]
    pub policy: MatchPolicy,
}

impl ProgressUpdate {
    /// Plan the update `distance` causes on `challenge` under `policy`.
    pub fn plan(challenge: &Challenge, distance: f64, policy: MatchPolicy) -> Self {
        Self {
            challenge_id: challenge.challenge_id.clone(),
            delta: distance,
            policy,
        }
    }

    /// Status to write alongside the increment, given the stored record.
    ///
    /// `None` leaves the stored status alone. A stored `completed` is
    /// terminal and always yields `None`.
    pub fn status_for(&self, stored: &Challenge) -> Option<ChallengeStatus> {
        if stored.status.is_completed() {
            return None;
        }
        let total = stored.completed_meters + self.delta;
        self.policy.status_after(total >= stored.target_meters)
    }

    /// Apply this update to `record` in place, returning the status written.
    ///
    /// `completed_meters` grows by exactly `delta`, with no clamping.
    pub fn apply_to(&self, record: &mut Challenge) -> Option<ChallengeStatus> {
        let status = self.status_for(record);
        record.completed_meters += self.delta;
        if let Some(status) = status {
            record.status = status;
        }
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_challenge(status: ChallengeStatus, completed: f64, target: f64) -> Challenge {
        Challenge {
            user_id: "u1".to_string(),
            challenge_id: "c1".to_string(),
            status,
            target_meters: target,
            completed_meters: completed,
            start_date: None,
            end_date: None,
        }
    }

    #[test]
    fn test_crossing_target_completes() {
        let mut record = make_challenge(ChallengeStatus::Current, 4000.0, 5000.0);
        let update = ProgressUpdate::plan(&record, 1500.0, MatchPolicy::TimeWindow);

        assert_eq!(update.delta, 1500.0);
        assert_eq!(update.apply_to(&mut record), Some(ChallengeStatus::Completed));
        assert_eq!(record.completed_meters, 5500.0);
        assert_eq!(record.status, ChallengeStatus::Completed);
    }

    #[test]
    fn test_exactly_at_target_completes() {
        let mut record = make_challenge(ChallengeStatus::Active, 4000.0, 5000.0);
        let update = ProgressUpdate::plan(&record, 1000.0, MatchPolicy::StatusOnly);

        assert_eq!(update.apply_to(&mut record), Some(ChallengeStatus::Completed));
        assert_eq!(record.completed_meters, 5000.0);
    }

    #[test]
    fn test_below_target_window_rewrites_current() {
        let mut record = make_challenge(ChallengeStatus::Current, 100.0, 5000.0);
        let update = ProgressUpdate::plan(&record, 400.0, MatchPolicy::TimeWindow);

        assert_eq!(update.apply_to(&mut record), Some(ChallengeStatus::Current));
        assert_eq!(record.completed_meters, 500.0);
        assert_eq!(record.status, ChallengeStatus::Current);
    }

    #[test]
    fn test_below_target_status_only_leaves_status() {
        let mut record = make_challenge(ChallengeStatus::Active, 100.0, 5000.0);
        let update = ProgressUpdate::plan(&record, 400.0, MatchPolicy::StatusOnly);

        assert_eq!(update.apply_to(&mut record), None);
        assert_eq!(record.status, ChallengeStatus::Active);
    }

    #[test]
    fn test_zero_distance() {
        let mut record = make_challenge(ChallengeStatus::Current, 100.0, 5000.0);
        let update = ProgressUpdate::plan(&record, 0.0, MatchPolicy::TimeWindow);

        assert_eq!(update.apply_to(&mut record), Some(ChallengeStatus::Current));
        assert_eq!(record.completed_meters, 100.0);
    }

    #[test]
    fn test_overshoot_is_not_clamped() {
        let mut record = make_challenge(ChallengeStatus::Current, 0.0, 1000.0);
        let update = ProgressUpdate::plan(&record, 42_195.0, MatchPolicy::TimeWindow);

        update.apply_to(&mut record);
        assert_eq!(record.completed_meters, 42_195.0);
    }

    #[test]
    fn test_stale_plan_never_reopens_completed() {
        // Both updates planned from the same snapshot, the first completes it.
        let snapshot = make_challenge(ChallengeStatus::Current, 4000.0, 5000.0);
        let first = ProgressUpdate::plan(&snapshot, 1500.0, MatchPolicy::TimeWindow);
        let second = ProgressUpdate::plan(&snapshot, 100.0, MatchPolicy::TimeWindow);

        let mut stored = snapshot.clone();
        first.apply_to(&mut stored);
        assert_eq!(second.apply_to(&mut stored), None);

        assert_eq!(stored.completed_meters, 5600.0);
        assert_eq!(stored.status, ChallengeStatus::Completed);
    }

    #[test]
    fn test_status_decided_from_stored_total() {
        // Planned from 1000 meters, but storage already holds 4900.
        let snapshot = make_challenge(ChallengeStatus::Current, 1000.0, 5000.0);
        let update = ProgressUpdate::plan(&snapshot, 200.0, MatchPolicy::TimeWindow);

        let mut stored = make_challenge(ChallengeStatus::Current, 4900.0, 5000.0);
        assert_eq!(update.apply_to(&mut stored), Some(ChallengeStatus::Completed));
        assert_eq!(stored.completed_meters, 5100.0);
    }
}
