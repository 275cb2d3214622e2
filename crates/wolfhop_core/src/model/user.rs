//! User account record.
//!
//! # Invariants
//! - `email` is stored trimmed and lowercased; lookups normalize the same way.
//! - `password_hash` is an argon2 PHC string and never leaves the core.

use once_cell::sync::Lazy;
use regex::Regex;
use uuid::Uuid;

use super::now_epoch_ms;

pub type UserId = Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub display_name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: i64,
}

impl User {
    /// Builds a fresh user record with a generated id.
    ///
    /// `email` is normalized; `display_name` is trimmed.
    pub fn new(
        display_name: impl Into<String>,
        email: &str,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name: display_name.into().trim().to_string(),
            email: normalize_email(email),
            password_hash: password_hash.into(),
            created_at: now_epoch_ms(),
        }
    }
}

/// Canonical email form used for storage and lookups.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Cheap shape check; deliverability is not our concern.
pub fn is_plausible_email(email: &str) -> bool {
    EMAIL_RE.is_match(email.trim())
}
