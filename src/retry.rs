// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Bounded exponential backoff for the error requeue path.
//!
//! When a reconciliation fails, the object is requeued after a delay that
//! doubles per consecutive failure, with randomization (jitter) to prevent
//! thundering herd, bounded by a fixed maximum. Cancellations never reach
//! this path.

use std::time::Duration;

use rand::RngExt;

use crate::constants::{ERROR_REQUEUE_BASE_SECS, ERROR_REQUEUE_MAX_SECS};

/// Randomization factor applied to every computed delay (±10%)
const RANDOMIZATION_FACTOR: f64 = 0.1;

/// Backoff multiplier (exponential growth factor)
const BACKOFF_MULTIPLIER: f64 = 2.0;

/// Compute the requeue delay for the n-th consecutive failure (1-based).
///
/// Delay grows as `base * 2^(attempt-1)`, capped at
/// [`ERROR_REQUEUE_MAX_SECS`], then jittered by ±10%.
#[must_use]
pub fn backoff_for_attempt(attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(16);
    let raw = ERROR_REQUEUE_BASE_SECS as f64 * BACKOFF_MULTIPLIER.powi(exponent as i32);
    let capped = raw.min(ERROR_REQUEUE_MAX_SECS as f64);

    let jitter = rand::rng().random_range(-RANDOMIZATION_FACTOR..=RANDOMIZATION_FACTOR);
    let jittered = capped * (1.0 + jitter);

    Duration::from_millis((jittered * 1000.0).max(0.0) as u64)
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod retry_tests;
