// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Progress accumulation service.
//!
//! Handles the core workflow for one workout event:
//! 1. Normalize the envelope into a [`WorkoutEvent`]
//! 2. Match the user's eligible challenges
//! 3. Plan and persist a progress update per challenge
//! 4. Shape the outcome into an [`EventResponse`]
//!
//! Redelivered events are applied again; there is no deduplication.

use std::sync::Arc;

use crate::db::ChallengeStore;
use crate::error::{AppError, Result};
use crate::models::{
    Challenge, Eligibility, EventResponse, MatchPolicy, ProgressUpdate, WorkoutEvent,
};
use crate::services::{matcher, progress};

/// Applies workout distance to a user's challenges.
#[derive(Clone)]
pub struct ProgressAccumulator {
    store: Arc<dyn ChallengeStore>,
    policy: MatchPolicy,
}

/// What an event did: every updated challenge as left in storage.
#[derive(Debug)]
pub struct AccumulateOutcome {
    pub user_id: String,
    pub challenges: Vec<Challenge>,
}

impl AccumulateOutcome {
    /// Updated challenges that are now `completed`.
    pub fn completed(&self) -> impl Iterator<Item = &Challenge> {
        self.challenges.iter().filter(|c| c.status.is_completed())
    }
}

impl ProgressAccumulator {
    pub fn new(store: Arc<dyn ChallengeStore>, policy: MatchPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> MatchPolicy {
        self.policy
    }

    /// Handle a raw JSON body. Never fails; every outcome is an envelope.
    pub async fn handle_body(&self, body: &[u8]) -> EventResponse {
        match WorkoutEvent::from_slice(body) {
            Ok(event) => self.handle_event(&event).await,
            Err(e) => reject(&e),
        }
    }

    /// Handle an already-parsed JSON envelope.
    pub async fn handle_value(&self, envelope: serde_json::Value) -> EventResponse {
        match WorkoutEvent::from_value(envelope) {
            Ok(event) => self.handle_event(&event).await,
            Err(e) => reject(&e),
        }
    }

    /// Handle a validated event and convert the outcome into an envelope.
    pub async fn handle_event(&self, event: &WorkoutEvent) -> EventResponse {
        match self.accumulate(event).await {
            Ok(outcome) => {
                tracing::info!(
                    user_id = %outcome.user_id,
                    event_id = ?event.event_id,
                    updated = outcome.challenges.len(),
                    completed = outcome.completed().count(),
                    "Successfully updated challenges for user"
                );
                EventResponse::updated()
            }
            Err(AppError::NotFound(reason)) => {
                tracing::info!(
                    user_id = %event.user_id,
                    event_id = ?event.event_id,
                    reason = %reason,
                    "No eligible challenges found for user"
                );
                EventResponse::no_eligible_challenges()
            }
            Err(e @ AppError::InvalidEvent(_)) => reject(&e),
            Err(e) => {
                tracing::error!(
                    user_id = %event.user_id,
                    event_id = ?event.event_id,
                    error = %e,
                    "Error updating challenges for user"
                );
                EventResponse::from(&e)
            }
        }
    }

    /// Match and update challenges for one event.
    ///
    /// Returns [`AppError::NotFound`] when nothing is eligible, in which case
    /// no write is attempted.
    pub async fn accumulate(&self, event: &WorkoutEvent) -> Result<AccumulateOutcome> {
        let criteria = Eligibility::for_event(event, self.policy)?;

        tracing::debug!(
            user_id = %event.user_id,
            event_id = ?event.event_id,
            distance = event.distance_in_meters,
            activity_type = ?event.activity_type,
            policy = %self.policy,
            "Processing workout event"
        );

        let challenges = matcher::find_eligible(self.store.as_ref(), &criteria).await?;

        let planned: Vec<ProgressUpdate> = challenges
            .iter()
            .map(|c| ProgressUpdate::plan(c, event.distance_in_meters, self.policy))
            .collect();

        let challenges =
            progress::apply_updates(self.store.as_ref(), &event.user_id, planned).await?;

        Ok(AccumulateOutcome {
            user_id: event.user_id.clone(),
            challenges,
        })
    }
}

fn reject(err: &AppError) -> EventResponse {
    tracing::warn!(error = %err, "Invalid event structure");
    EventResponse::from(err)
}
