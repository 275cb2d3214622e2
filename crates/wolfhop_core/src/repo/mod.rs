//! Repository contracts and SQLite implementations for every collection.
//!
//! # Responsibility
//! - Define one use-case oriented data access trait per record collection.
//! - Keep SQL details behind the persistence boundary.
//!
//! # Invariants
//! - Repositories only accept connections migrated to the latest schema.
//! - Ordered sets (friends, herd members, reaction lists) are read back in
//!   insertion order.
//! - Uniqueness violations surface as `RepoError::Conflict`, not as raw
//!   SQLite errors.

use crate::db::migrations::{current_version, latest_version};
use crate::db::DbError;
use rusqlite::{Connection, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod friend_repo;
pub mod herd_repo;
pub mod notification_repo;
pub mod reflection_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Targeted record does not exist.
    NotFound(Uuid),
    /// A uniqueness constraint rejected the write.
    Conflict(&'static str),
    /// Connection schema is not at the version this binary expects.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Persisted data cannot be converted to a valid record.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::Conflict(constraint) => write!(f, "uniqueness conflict on {constraint}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

fn ensure_connection_ready(conn: &Connection) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version = current_version(conn)?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }
    Ok(())
}

fn parse_uuid(value: &str, column: &str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{value}` in {column}")))
}

/// `?, ?, ?` for an `IN (...)` clause with `count` bind slots.
fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.code == ErrorCode::ConstraintViolation
                && matches!(
                    failure.extended_code,
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                        | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                )
        }
        _ => false,
    }
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::{ensure_connection_ready, placeholders, RepoError};
    use rusqlite::Connection;

    #[test]
    fn placeholders_match_count() {
        assert_eq!(placeholders(1), "?");
        assert_eq!(placeholders(3), "?, ?, ?");
    }

    #[test]
    fn unmigrated_connection_is_rejected() {
        let conn = Connection::open_in_memory().unwrap();
        let err = ensure_connection_ready(&conn).unwrap_err();
        assert!(matches!(
            err,
            RepoError::UninitializedConnection {
                actual_version: 0,
                ..
            }
        ));
    }
}
