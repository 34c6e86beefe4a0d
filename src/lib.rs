// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Challenge-Progress: accumulate workout distance into user challenges
//!
//! This crate provides the event handler that takes a workout event
//! (user and distance), finds the user's eligible distance challenges and
//! advances them, marking each completed once its target is reached.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::ProgressAccumulator;

/// Shared application state.
///
/// Built once at startup; the accumulator holds the process-wide store client.
pub struct AppState {
    pub config: Config,
    pub accumulator: ProgressAccumulator,
}
