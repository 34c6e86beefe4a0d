// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process challenge store for local runs and tests.
//!
//! Counts every query and update attempt, and can be told to fail queries
//! or updates for specific challenges.

use async_trait::async_trait;
use dashmap::{DashMap, DashSet};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::db::ChallengeStore;
use crate::error::AppError;
use crate::models::{Challenge, Eligibility, ProgressUpdate};

type ChallengeKey = (String, String);

#[derive(Default)]
pub struct MemoryStore {
    challenges: DashMap<ChallengeKey, Challenge>,
    queries: AtomicUsize,
    update_attempts: AtomicUsize,
    fail_queries: AtomicBool,
    fail_update_ids: DashSet<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_challenges(challenges: impl IntoIterator<Item = Challenge>) -> Self {
        let store = Self::new();
        for challenge in challenges {
            store.insert(challenge);
        }
        store
    }

    /// Seed from a JSON array of challenges.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let json_data = fs::read_to_string(path.as_ref())?;
        let challenges: Vec<Challenge> = serde_json::from_str(&json_data)?;
        Ok(Self::with_challenges(challenges))
    }

    pub fn insert(&self, challenge: Challenge) {
        let key = (challenge.user_id.clone(), challenge.challenge_id.clone());
        self.challenges.insert(key, challenge);
    }

    pub fn get(&self, user_id: &str, challenge_id: &str) -> Option<Challenge> {
        self.challenges
            .get(&(user_id.to_string(), challenge_id.to_string()))
            .map(|entry| entry.value().clone())
    }

    pub fn len(&self) -> usize {
        self.challenges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.challenges.is_empty()
    }

    /// Number of `query_challenges` calls, including failed ones.
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Number of `apply_progress` calls, including failed ones.
    pub fn update_attempts(&self) -> usize {
        self.update_attempts.load(Ordering::SeqCst)
    }

    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    /// Make `apply_progress` fail for these challenge ids.
    pub fn set_fail_update_ids<I, S>(&self, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fail_update_ids.clear();
        for id in ids {
            self.fail_update_ids.insert(id.into());
        }
    }
}

#[async_trait]
impl ChallengeStore for MemoryStore {
    async fn query_challenges(&self, criteria: &Eligibility) -> Result<Vec<Challenge>, AppError> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(AppError::Database(format!(
                "Injected query failure for user {}",
                criteria.user_id
            )));
        }

        let mut found: Vec<Challenge> = self
            .challenges
            .iter()
            .filter(|entry| {
                entry.user_id == criteria.user_id && entry.status == criteria.status
            })
            .map(|entry| entry.value().clone())
            .collect();

        // Sort-key order, as a keyed store would return them.
        found.sort_by(|a, b| a.challenge_id.cmp(&b.challenge_id));
        Ok(found)
    }

    async fn apply_progress(
        &self,
        user_id: &str,
        update: &ProgressUpdate,
    ) -> Result<Challenge, AppError> {
        self.update_attempts.fetch_add(1, Ordering::SeqCst);

        if self.fail_update_ids.contains(&update.challenge_id) {
            return Err(AppError::Database(format!(
                "Injected update failure for challenge {}",
                update.challenge_id
            )));
        }

        let mut entry = self
            .challenges
            .get_mut(&(user_id.to_string(), update.challenge_id.clone()))
            .ok_or_else(|| {
                AppError::Database(format!(
                    "Challenge {}/{} does not exist",
                    user_id, update.challenge_id
                ))
            })?;

        // Decided under the entry lock, so the status follows the stored total.
        update.apply_to(entry.value_mut());

        Ok(entry.value().clone())
    }
}
