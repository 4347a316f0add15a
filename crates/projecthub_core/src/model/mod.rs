//! Domain records persisted by the key-value stores.
//!
//! # Responsibility
//! - Define the typed shapes of users, projects, participation records and
//!   like state.
//! - Keep the persisted JSON field naming (camelCase) in one place.
//!
//! # Invariants
//! - Every record is identified by a stable UUID that is never reused.
//! - Timestamps are Unix epoch milliseconds.

pub mod like;
pub mod participant;
pub mod project;
pub mod user;

use std::time::{SystemTime, UNIX_EPOCH};

/// Returns the current wall-clock time in epoch milliseconds.
///
/// Clocks set before 1970 collapse to `0`.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
