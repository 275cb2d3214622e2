//! User repository contract and SQLite implementation.
//!
//! # Invariants
//! - `email` is unique; a duplicate insert maps to `RepoError::Conflict`.
//! - Email lookups use the normalized form.

use super::{
    ensure_connection_ready, is_unique_violation, parse_uuid, placeholders, RepoError,
    RepoResult,
};
use crate::model::user::{normalize_email, User, UserId};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::HashMap;

const USER_SELECT_SQL: &str = "SELECT
    uuid,
    display_name,
    email,
    password_hash,
    created_at
FROM users";

/// Repository interface for user accounts.
pub trait UserRepository {
    fn create_user(&self, user: &User) -> RepoResult<UserId>;
    /// Full replace of mutable profile fields.
    fn update_user(&self, user: &User) -> RepoResult<()>;
    fn get_user(&self, id: UserId) -> RepoResult<Option<User>>;
    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>>;
    /// Membership query; results follow the order of `ids`, unknown ids are
    /// skipped and repeated ids appear once.
    fn list_users_by_ids(&self, ids: &[UserId]) -> RepoResult<Vec<User>>;
    fn list_users(&self) -> RepoResult<Vec<User>>;
}

/// SQLite-backed user repository.
#[derive(Clone, Copy)]
pub struct SqliteUserRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteUserRepository<'conn> {
    /// Constructs a repository from a migrated connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl UserRepository for SqliteUserRepository<'_> {
    fn create_user(&self, user: &User) -> RepoResult<UserId> {
        self.conn
            .execute(
                "INSERT INTO users (
                    uuid,
                    display_name,
                    email,
                    password_hash,
                    created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    user.id.to_string(),
                    user.display_name.as_str(),
                    normalize_email(&user.email),
                    user.password_hash.as_str(),
                    user.created_at,
                ],
            )
            .map_err(|err| {
                if is_unique_violation(&err) {
                    RepoError::Conflict("users.email")
                } else {
                    err.into()
                }
            })?;

        Ok(user.id)
    }

    fn update_user(&self, user: &User) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE users
             SET
                display_name = ?2,
                password_hash = ?3
             WHERE uuid = ?1;",
            params![
                user.id.to_string(),
                user.display_name.as_str(),
                user.password_hash.as_str(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(user.id));
        }
        Ok(())
    }

    fn get_user(&self, id: UserId) -> RepoResult<Option<User>> {
        let row = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                |row| RawUser::from_row(row),
            )
            .optional()?;
        row.map(RawUser::into_user).transpose()
    }

    fn find_user_by_email(&self, email: &str) -> RepoResult<Option<User>> {
        let row = self
            .conn
            .query_row(
                &format!("{USER_SELECT_SQL} WHERE email = ?1;"),
                [normalize_email(email)],
                |row| RawUser::from_row(row),
            )
            .optional()?;
        row.map(RawUser::into_user).transpose()
    }

    fn list_users_by_ids(&self, ids: &[UserId]) -> RepoResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "{USER_SELECT_SQL} WHERE uuid IN ({});",
            placeholders(ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(ids.iter().map(|id| id.to_string())))?;
        let mut by_id = HashMap::new();
        while let Some(row) = rows.next()? {
            let user = RawUser::from_row(row)?.into_user()?;
            by_id.insert(user.id, user);
        }

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    fn list_users(&self) -> RepoResult<Vec<User>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{USER_SELECT_SQL} ORDER BY created_at ASC, rowid ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut users = Vec::new();
        while let Some(row) = rows.next()? {
            users.push(RawUser::from_row(row)?.into_user()?);
        }
        Ok(users)
    }
}

/// Row image read inside the rusqlite closure, converted outside of it so
/// id parsing can report `RepoError::InvalidData`.
struct RawUser {
    uuid: String,
    display_name: String,
    email: String,
    password_hash: String,
    created_at: i64,
}

impl RawUser {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            uuid: row.get("uuid")?,
            display_name: row.get("display_name")?,
            email: row.get("email")?,
            password_hash: row.get("password_hash")?,
            created_at: row.get("created_at")?,
        })
    }

    fn into_user(self) -> RepoResult<User> {
        Ok(User {
            id: parse_uuid(&self.uuid, "users.uuid")?,
            display_name: self.display_name,
            email: self.email,
            password_hash: self.password_hash,
            created_at: self.created_at,
        })
    }
}
