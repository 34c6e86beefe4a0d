// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed challenge operations.
//!
//! Challenges live in a single collection, one document per
//! `(user_id, challenge_id)`. Progress is written with a field transform
//! (server-side increment) so concurrent events for the same user do not
//! lose distance. The record is read inside the same transaction to decide
//! the status, and every write requires the document to exist.

use async_trait::async_trait;
use firestore::errors::{BackoffError, FirestoreError};
use firestore::{FirestoreTransactionOptions, FirestoreWritePrecondition};
use serde::{Deserialize, Serialize};

use crate::db::{challenge_doc_id, collections, ChallengeStore};
use crate::error::AppError;
use crate::models::{Challenge, ChallengeStatus, Eligibility, ProgressUpdate};

/// Partial document written alongside the increment.
#[derive(Serialize, Deserialize)]
struct StatusPatch {
    status: ChallengeStatus,
}

/// Upper bound on transaction retries under contention.
const TRANSACTION_MAX_ELAPSED_SECS: i64 = 30;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
    collection: String,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
            collection: collections::CHALLENGES.to_string(),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
            collection: collections::CHALLENGES.to_string(),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self {
            client: None,
            collection: collections::CHALLENGES.to_string(),
        }
    }

    /// Use a different collection for challenge documents.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into();
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Challenge Operations ────────────────────────────────────

    /// Get a single challenge by key.
    pub async fn get_challenge(
        &self,
        user_id: &str,
        challenge_id: &str,
    ) -> Result<Option<Challenge>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(&self.collection)
            .obj()
            .one(&challenge_doc_id(user_id, challenge_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or replace a challenge.
    ///
    /// Not used when processing events; challenges are provisioned elsewhere.
    pub async fn upsert_challenge(&self, challenge: &Challenge) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(&self.collection)
            .document_id(challenge_doc_id(&challenge.user_id, &challenge.challenge_id))
            .object(challenge)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl ChallengeStore for FirestoreDb {
    async fn query_challenges(&self, criteria: &Eligibility) -> Result<Vec<Challenge>, AppError> {
        let user_id = criteria.user_id.as_str();
        let status = criteria.status.as_str();

        self.get_client()?
            .fluent()
            .select()
            .from(self.collection.as_str())
            .filter(|q| {
                q.for_all([
                    q.field("user_id").eq(user_id),
                    q.field("status").eq(status),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    async fn apply_progress(
        &self,
        user_id: &str,
        update: &ProgressUpdate,
    ) -> Result<Challenge, AppError> {
        let client = self.get_client()?;
        let collection = self.collection.as_str();
        let doc_id = challenge_doc_id(user_id, &update.challenge_id);

        let options = FirestoreTransactionOptions::new()
            .with_max_elapsed_time(chrono::Duration::seconds(TRANSACTION_MAX_ELAPSED_SECS));

        // The read joins the transaction: the status is decided from the
        // stored total, and a conflicting commit reruns the whole body.
        let after = client
            .run_transaction_with_options(
                |db, transaction| {
                    let collection = collection.to_string();
                    let doc_id = doc_id.clone();
                    let update = update.clone();

                    Box::pin(async move {
                        let mut record = db
                            .fluent()
                            .select()
                            .by_id_in(&collection)
                            .obj::<Challenge>()
                            .one(&doc_id)
                            .await
                            .map_err(|e| in_transaction(e, "Failed to read challenge"))?
                            .ok_or_else(|| {
                                BackoffError::permanent(AppError::Database(format!(
                                    "Challenge {} does not exist",
                                    doc_id
                                )))
                            })?;

                        let delta = update.delta;
                        match update.apply_to(&mut record) {
                            Some(status) => {
                                db.fluent()
                                    .update()
                                    .fields(["status"])
                                    .in_col(&collection)
                                    .precondition(FirestoreWritePrecondition::Exists(true))
                                    .document_id(&doc_id)
                                    .object(&StatusPatch { status })
                                    .transforms(|t| {
                                        t.fields([t.field("completed_meters").increment(delta)])
                                    })
                                    .add_to_transaction(transaction)
                                    .map_err(write_error)?;
                            }
                            None => {
                                db.fluent()
                                    .update()
                                    .in_col(&collection)
                                    .precondition(FirestoreWritePrecondition::Exists(true))
                                    .document_id(&doc_id)
                                    .transforms(|t| {
                                        t.fields([t.field("completed_meters").increment(delta)])
                                    })
                                    .only_transform()
                                    .add_to_transaction(transaction)
                                    .map_err(write_error)?;
                            }
                        }

                        Ok::<Challenge, BackoffError<AppError>>(record)
                    })
                },
                options,
            )
            .await
            .map_err(from_transaction)?;

        tracing::debug!(
            user_id,
            challenge_id = %update.challenge_id,
            delta = update.delta,
            completed_meters = after.completed_meters,
            status = %after.status,
            "Challenge progress committed"
        );

        Ok(after)
    }
}

/// Wrap a Firestore error raised inside the transaction body.
/// Errors the backend marks retryable (contention) rerun the body.
fn in_transaction(err: FirestoreError, context: &str) -> BackoffError<AppError> {
    let retryable = matches!(&err, FirestoreError::DatabaseError(db_err) if db_err.retry_possible);
    let err = AppError::Database(format!("{}: {}", context, err));
    if retryable {
        BackoffError::transient(err)
    } else {
        BackoffError::permanent(err)
    }
}

/// The write could not be built (serialization), not a storage failure.
fn write_error(err: FirestoreError) -> BackoffError<AppError> {
    BackoffError::permanent(AppError::Internal(
        anyhow::Error::new(err).context("Failed to build progress write"),
    ))
}

/// Recover the body's own error from a failed transaction.
fn from_transaction(err: FirestoreError) -> AppError {
    match err {
        FirestoreError::ErrorInTransaction(inner) => match inner.source.downcast::<AppError>() {
            Ok(app_err) => *app_err,
            Err(source) => AppError::Database(source.to_string()),
        },
        other => AppError::Database(format!("Progress transaction failed: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MatchPolicy;
    use firestore::errors::{
        FirestoreDatabaseError, FirestoreErrorInTransaction, FirestoreErrorPublicGenericDetails,
        FirestoreSerializationError,
    };

    fn criteria() -> Eligibility {
        Eligibility {
            user_id: "u1".to_string(),
            status: ChallengeStatus::Current,
            at: None,
        }
    }

    #[tokio::test]
    async fn test_offline_query_is_database_error() {
        let db = FirestoreDb::new_mock();
        let result = db.query_challenges(&criteria()).await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[tokio::test]
    async fn test_offline_update_is_database_error() {
        let db = FirestoreDb::new_mock();
        let update = ProgressUpdate {
            challenge_id: "c1".to_string(),
            delta: 10.0,
            policy: MatchPolicy::TimeWindow,
        };
        let result = db.apply_progress("u1", &update).await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }

    fn database_error(retry_possible: bool) -> FirestoreError {
        FirestoreError::DatabaseError(FirestoreDatabaseError {
            public: FirestoreErrorPublicGenericDetails {
                code: "Aborted".to_string(),
            },
            details: "contention".to_string(),
            retry_possible,
        })
    }

    #[test]
    fn test_contention_reruns_transaction() {
        assert!(matches!(
            in_transaction(database_error(true), "read"),
            BackoffError::Transient { err: AppError::Database(_), .. }
        ));
        assert!(matches!(
            in_transaction(database_error(false), "read"),
            BackoffError::Permanent(AppError::Database(_))
        ));
    }

    #[test]
    fn test_unbuildable_write_is_internal() {
        let err = FirestoreError::SerializeError(FirestoreSerializationError::from_message("bad"));
        match write_error(err) {
            BackoffError::Permanent(AppError::Internal(e)) => {
                assert!(e.to_string().contains("Failed to build progress write"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_transaction_error_keeps_body_error() {
        let err = FirestoreError::ErrorInTransaction(FirestoreErrorInTransaction {
            transaction_id: vec![1, 2, 3],
            source: Box::new(AppError::Database("Challenge x does not exist".to_string())),
        });
        match from_transaction(err) {
            AppError::Database(msg) => assert_eq!(msg, "Challenge x does not exist"),
            other => panic!("unexpected {:?}", other),
        }

        assert!(matches!(
            from_transaction(database_error(false)),
            AppError::Database(_)
        ));
    }

    #[test]
    fn test_with_collection() {
        let db = FirestoreDb::new_mock().with_collection("challenges_test");
        assert_eq!(db.collection(), "challenges_test");
    }
}
