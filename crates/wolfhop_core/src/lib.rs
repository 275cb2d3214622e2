//! Core domain logic for WolfHop.
//! This crate is the single source of truth for business invariants.

pub mod db;
pub mod identity;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use identity::{IdentityError, IdentityProvider, JwtIdentityProvider};
pub use logging::{default_log_level, init_logging, init_stderr_logging, logging_status};
pub use model::herd::{Herd, HerdId, HerdWithMembers};
pub use model::notification::{Notification, NotificationId};
pub use model::reflection::{
    Reaction, ReactionId, Reflection, ReflectionDraft, ReflectionId, ReflectionWithReactions,
    ShareKind, ShareTarget, ShareTargetError,
};
pub use model::user::{User, UserId};
pub use repo::{RepoError, RepoResult};
pub use service::error::{Entity, ErrorKind, ServiceError, ServiceResult};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
