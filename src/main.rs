// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Challenge-Progress API Server
//!
//! Receives workout events and advances the matching distance challenges.

use challenge_progress::{
    config::{Config, StorageBackend},
    db::{ChallengeStore, FirestoreDb, MemoryStore},
    services::ProgressAccumulator,
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        policy = %config.match_policy,
        "Starting Challenge-Progress API"
    );

    // Storage client is created once and shared for the life of the process
    let store: Arc<dyn ChallengeStore> = match &config.storage_backend {
        StorageBackend::Firestore => Arc::new(
            FirestoreDb::new(&config.gcp_project_id)
                .await?
                .with_collection(config.challenges_collection.clone()),
        ),
        StorageBackend::Memory { seed_path } => {
            let store = match seed_path {
                Some(path) => {
                    tracing::info!(path = %path.display(), "Loading seed challenges");
                    MemoryStore::load_from_file(path)?
                }
                None => MemoryStore::new(),
            };
            tracing::warn!(
                challenges = store.len(),
                "Using in-memory challenge store; progress is not persisted"
            );
            Arc::new(store)
        }
    };

    let accumulator = ProgressAccumulator::new(store, config.match_policy);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        accumulator,
    });

    // Build router
    let app = challenge_progress::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("challenge_progress=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}
