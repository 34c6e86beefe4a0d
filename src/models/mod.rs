// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod challenge;
pub mod event;
pub mod policy;
pub mod progress;
pub mod response;

pub use challenge::{Challenge, ChallengeStatus};
pub use event::WorkoutEvent;
pub use policy::{Eligibility, MatchPolicy};
pub use progress::ProgressUpdate;
pub use response::EventResponse;
