// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod accumulator;
pub mod matcher;
pub mod progress;

pub use accumulator::{AccumulateOutcome, ProgressAccumulator};
