//! Friend list repository contract and SQLite implementation.
//!
//! # Invariants
//! - One `friend_lists` row per user, created lazily and never deleted.
//! - An entry `(user, friend)` exists at most once; appends are a single
//!   conditional insert so concurrent adds cannot duplicate it.
//! - Entries are returned in the order they were appended.

use super::{ensure_connection_ready, parse_uuid, RepoResult};
use crate::model::friend::FriendList;
use crate::model::user::UserId;
use rusqlite::{params, Connection, OptionalExtension};

/// Repository interface for per-user friend lists.
pub trait FriendRepository {
    /// Returns the list when one has been created for `user_id`.
    fn get_friend_list(&self, user_id: UserId) -> RepoResult<Option<FriendList>>;
    /// Fetches the list, creating an empty one first when absent.
    fn ensure_friend_list(&self, user_id: UserId) -> RepoResult<FriendList>;
    /// Appends `friend_id` unless already present. Returns whether a new entry
    /// was written. Creates the list when needed.
    fn append_friend(&self, user_id: UserId, friend_id: UserId) -> RepoResult<bool>;
    /// Removes `friend_id` from `user_id`'s list only. Returns whether an entry
    /// was removed.
    fn remove_friend(&self, user_id: UserId, friend_id: UserId) -> RepoResult<bool>;
}

/// SQLite-backed friend list repository.
#[derive(Clone, Copy)]
pub struct SqliteFriendRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFriendRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn create_list_if_absent(&self, user_id: UserId) -> RepoResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO friend_lists (user_uuid) VALUES (?1);",
            [user_id.to_string()],
        )?;
        Ok(())
    }

    fn load_friend_ids(&self, user_id: UserId) -> RepoResult<Vec<UserId>> {
        let mut stmt = self.conn.prepare(
            "SELECT friend_uuid
             FROM friend_list_entries
             WHERE user_uuid = ?1
             ORDER BY position ASC;",
        )?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut ids = Vec::new();
        while let Some(row) = rows.next()? {
            let value: String = row.get(0)?;
            ids.push(parse_uuid(&value, "friend_list_entries.friend_uuid")?);
        }
        Ok(ids)
    }
}

impl FriendRepository for SqliteFriendRepository<'_> {
    fn get_friend_list(&self, user_id: UserId) -> RepoResult<Option<FriendList>> {
        let exists = self
            .conn
            .query_row(
                "SELECT 1 FROM friend_lists WHERE user_uuid = ?1;",
                [user_id.to_string()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .is_some();
        if !exists {
            return Ok(None);
        }

        Ok(Some(FriendList {
            user_id,
            friend_ids: self.load_friend_ids(user_id)?,
        }))
    }

    fn ensure_friend_list(&self, user_id: UserId) -> RepoResult<FriendList> {
        self.create_list_if_absent(user_id)?;
        Ok(FriendList {
            user_id,
            friend_ids: self.load_friend_ids(user_id)?,
        })
    }

    fn append_friend(&self, user_id: UserId, friend_id: UserId) -> RepoResult<bool> {
        self.create_list_if_absent(user_id)?;
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO friend_list_entries (user_uuid, friend_uuid, position)
             SELECT ?1, ?2, COALESCE(MAX(position) + 1, 0)
             FROM friend_list_entries
             WHERE user_uuid = ?1;",
            params![user_id.to_string(), friend_id.to_string()],
        )?;
        Ok(changed == 1)
    }

    fn remove_friend(&self, user_id: UserId, friend_id: UserId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM friend_list_entries WHERE user_uuid = ?1 AND friend_uuid = ?2;",
            params![user_id.to_string(), friend_id.to_string()],
        )?;
        Ok(changed > 0)
    }
}
