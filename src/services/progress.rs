// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Progress updater: persists planned updates for one event.
//!
//! Each challenge is written independently and concurrently. There is no
//! all-or-nothing guarantee: if one write fails the others may already be
//! committed, and the first failure is returned after every write settles.

use futures_util::{stream, StreamExt};

use crate::db::ChallengeStore;
use crate::error::{AppError, Result};
use crate::models::{Challenge, ProgressUpdate};

const MAX_CONCURRENT_UPDATES: usize = 16;

/// Apply all `updates` for `user_id`, returning the records as left in
/// storage once every write succeeded.
pub async fn apply_updates(
    store: &dyn ChallengeStore,
    user_id: &str,
    updates: Vec<ProgressUpdate>,
) -> Result<Vec<Challenge>> {
    stream::iter(updates)
        .map(|update| async move {
            match store.apply_progress(user_id, &update).await {
                Ok(after) => {
                    tracing::info!(
                        user_id,
                        challenge_id = %update.challenge_id,
                        delta = update.delta,
                        completed_meters = after.completed_meters,
                        target_meters = after.target_meters,
                        status = %after.status,
                        "Challenge progress updated"
                    );
                    Ok(after)
                }
                Err(e) => {
                    tracing::error!(
                        user_id,
                        challenge_id = %update.challenge_id,
                        error = %e,
                        "Failed to update challenge progress"
                    );
                    Err(e)
                }
            }
        })
        .buffer_unordered(MAX_CONCURRENT_UPDATES)
        .collect::<Vec<Result<Challenge>>>()
        .await
        .into_iter()
        .collect::<std::result::Result<Vec<Challenge>, AppError>>()
}
