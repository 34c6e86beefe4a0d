// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge matching: which of a user's challenges an event advances.

use crate::db::ChallengeStore;
use crate::error::{AppError, Result};
use crate::models::{Challenge, Eligibility};

/// Find the challenges eligible under `criteria`, in storage order.
///
/// An empty result is reported as [`AppError::NotFound`]; callers treat it
/// as a terminal outcome rather than a failure.
pub async fn find_eligible(
    store: &dyn ChallengeStore,
    criteria: &Eligibility,
) -> Result<Vec<Challenge>> {
    let candidates = store.query_challenges(criteria).await?;
    let queried = candidates.len();

    let eligible: Vec<Challenge> = candidates
        .into_iter()
        .filter(|c| criteria.admits(c))
        .collect();

    tracing::debug!(
        user_id = %criteria.user_id,
        status = %criteria.status,
        at = ?criteria.at,
        queried,
        eligible = eligible.len(),
        "Matched challenges"
    );

    if eligible.is_empty() {
        return Err(AppError::NotFound(format!(
            "No {} challenges for user {}",
            criteria.status, criteria.user_id
        )));
    }

    Ok(eligible)
}
