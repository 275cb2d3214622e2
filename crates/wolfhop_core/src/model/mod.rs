//! Domain records for journaling, sharing, and social relationships.
//!
//! # Responsibility
//! - Define the canonical shapes used by repositories and services.
//! - Encode sharing audiences as types so invalid pairings cannot be built.
//!
//! # Invariants
//! - Every record is identified by a stable UUID v4 that is never reused.
//! - Timestamps are Unix epoch milliseconds.

use std::time::{SystemTime, UNIX_EPOCH};

pub mod friend;
pub mod herd;
pub mod notification;
pub mod reflection;
pub mod user;

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}
