//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;

use crate::db::collections;
use crate::models::MatchPolicy;

/// Header Cloud Tasks sets on every task delivery.
pub const QUEUE_NAME_HEADER: &str = "x-cloudtasks-queuename";

/// Which challenge store backs the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Firestore,
    /// In-process store, optionally seeded from a JSON file
    Memory { seed_path: Option<PathBuf> },
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project ID
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// Firestore collection holding challenge documents
    pub challenges_collection: String,
    /// Challenge selection policy
    pub match_policy: MatchPolicy,
    /// If set, `/tasks/*` requests must carry this queue name
    pub event_queue_name: Option<String>,
    pub storage_backend: StorageBackend,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            challenges_collection: collections::CHALLENGES.to_string(),
            match_policy: MatchPolicy::TimeWindow,
            event_queue_name: None,
            storage_backend: StorageBackend::Memory { seed_path: None },
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port = match non_empty("PORT") {
            Some(raw) => raw.parse::<u16>().map_err(|_| ConfigError::Invalid {
                var: "PORT",
                value: raw,
            })?,
            None => 8080,
        };

        let match_policy = match non_empty("CHALLENGE_POLICY") {
            Some(raw) => raw.parse::<MatchPolicy>().map_err(|_| ConfigError::Invalid {
                var: "CHALLENGE_POLICY",
                value: raw,
            })?,
            None => MatchPolicy::default(),
        };

        let storage_backend = match non_empty("STORAGE_BACKEND").as_deref() {
            None | Some("firestore") => StorageBackend::Firestore,
            Some("memory") => StorageBackend::Memory {
                seed_path: non_empty("MEMORY_SEED_PATH").map(PathBuf::from),
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "STORAGE_BACKEND",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            gcp_project_id: non_empty("GCP_PROJECT_ID").unwrap_or_else(|| "local-dev".to_string()),
            port,
            challenges_collection: non_empty("CHALLENGES_COLLECTION")
                .unwrap_or_else(|| collections::CHALLENGES.to_string()),
            match_policy,
            event_queue_name: non_empty("EVENT_QUEUE_NAME"),
            storage_backend,
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}
