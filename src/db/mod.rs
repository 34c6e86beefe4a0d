//! Database layer (Firestore, plus an in-process store).

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{Challenge, Eligibility, ProgressUpdate};

/// Collection names as constants.
pub mod collections {
    /// Challenge records, one document per `(user_id, challenge_id)`
    pub const CHALLENGES: &str = "challenges";
}

/// The two storage capabilities progress accumulation needs.
///
/// Implementations own the challenge records; callers never create or
/// delete them.
#[async_trait]
pub trait ChallengeStore: Send + Sync {
    /// All challenges for `criteria.user_id` with `criteria.status`.
    ///
    /// The time window in `criteria.at` is not applied here.
    async fn query_challenges(&self, criteria: &Eligibility) -> Result<Vec<Challenge>, AppError>;

    /// Atomically add `update.delta` to `completed_meters` and write the
    /// status [`ProgressUpdate::apply_to`] decides from the stored record,
    /// in the same operation. Returns the record as left in storage.
    ///
    /// A missing record is an error; it is never created.
    async fn apply_progress(
        &self,
        user_id: &str,
        update: &ProgressUpdate,
    ) -> Result<Challenge, AppError>;
}

/// Document id for a challenge: both key parts, URL-encoded and joined
/// with `:` (which encoding always escapes inside a part).
pub fn challenge_doc_id(user_id: &str, challenge_id: &str) -> String {
    format!(
        "{}:{}",
        urlencoding::encode(user_id),
        urlencoding::encode(challenge_id)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_doc_id_escapes_separators() {
        assert_eq!(challenge_doc_id("u1", "c1"), "u1:c1");
        assert_eq!(challenge_doc_id("a/b", "c d"), "a%2Fb:c%20d");
        assert_ne!(challenge_doc_id("a:b", "c"), challenge_doc_id("a", "b:c"));
    }
}
