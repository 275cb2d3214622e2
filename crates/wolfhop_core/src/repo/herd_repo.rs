//! Herd repository contract and SQLite implementation.
//!
//! # Invariants
//! - Herd row and member rows are written in one transaction.
//! - `replace_herd` rewrites the whole member set; positions restart at 0.
//! - Deleting a herd cascades to its member rows.

use super::{ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use crate::model::herd::{Herd, HerdId};
use crate::model::user::UserId;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};

const HERD_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    owner_uuid,
    created_at
FROM herds";

/// Repository interface for herds and their member sets.
pub trait HerdRepository {
    fn create_herd(&self, herd: &Herd) -> RepoResult<HerdId>;
    fn get_herd(&self, id: HerdId) -> RepoResult<Option<Herd>>;
    /// Every herd whose member set contains `user_id`, oldest first.
    fn list_herds_for_member(&self, user_id: UserId) -> RepoResult<Vec<Herd>>;
    /// Full replace of name and member set.
    fn replace_herd(&self, herd: &Herd) -> RepoResult<()>;
    fn delete_herd(&self, id: HerdId) -> RepoResult<()>;
}

/// SQLite-backed herd repository.
#[derive(Clone, Copy)]
pub struct SqliteHerdRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteHerdRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn load_herd(&self, raw: RawHerd) -> RepoResult<Herd> {
        let id = parse_uuid(&raw.uuid, "herds.uuid")?;
        Ok(Herd {
            id,
            name: raw.name,
            owner_id: parse_uuid(&raw.owner_uuid, "herds.owner_uuid")?,
            member_ids: load_member_ids(self.conn, id)?,
            created_at: raw.created_at,
        })
    }
}

impl HerdRepository for SqliteHerdRepository<'_> {
    fn create_herd(&self, herd: &Herd) -> RepoResult<HerdId> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "INSERT INTO herds (uuid, name, owner_uuid, created_at) VALUES (?1, ?2, ?3, ?4);",
            params![
                herd.id.to_string(),
                herd.name.as_str(),
                herd.owner_id.to_string(),
                herd.created_at,
            ],
        )?;
        write_members(&tx, herd.id, &herd.member_ids)?;
        tx.commit()?;
        Ok(herd.id)
    }

    fn get_herd(&self, id: HerdId) -> RepoResult<Option<Herd>> {
        let raw = self
            .conn
            .query_row(
                &format!("{HERD_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                |row| RawHerd::from_row(row),
            )
            .optional()?;
        raw.map(|raw| self.load_herd(raw)).transpose()
    }

    fn list_herds_for_member(&self, user_id: UserId) -> RepoResult<Vec<Herd>> {
        let mut stmt = self.conn.prepare(&format!(
            "{HERD_SELECT_SQL}
             WHERE EXISTS (
                SELECT 1
                FROM herd_members hm
                WHERE hm.herd_uuid = herds.uuid
                  AND hm.member_uuid = ?1
             )
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([user_id.to_string()])?;
        let mut raws = Vec::new();
        while let Some(row) = rows.next()? {
            raws.push(RawHerd::from_row(row)?);
        }
        raws.into_iter().map(|raw| self.load_herd(raw)).collect()
    }

    fn replace_herd(&self, herd: &Herd) -> RepoResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE herds SET name = ?2 WHERE uuid = ?1;",
            params![herd.id.to_string(), herd.name.as_str()],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(herd.id));
        }
        tx.execute(
            "DELETE FROM herd_members WHERE herd_uuid = ?1;",
            [herd.id.to_string()],
        )?;
        write_members(&tx, herd.id, &herd.member_ids)?;
        tx.commit()?;
        Ok(())
    }

    fn delete_herd(&self, id: HerdId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM herds WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

struct RawHerd {
    uuid: String,
    name: String,
    owner_uuid: String,
    created_at: i64,
}

impl RawHerd {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            uuid: row.get("uuid")?,
            name: row.get("name")?,
            owner_uuid: row.get("owner_uuid")?,
            created_at: row.get("created_at")?,
        })
    }
}

fn write_members(tx: &Transaction<'_>, herd_id: HerdId, member_ids: &[UserId]) -> RepoResult<()> {
    let mut stmt = tx.prepare(
        "INSERT OR IGNORE INTO herd_members (herd_uuid, member_uuid, position)
         VALUES (?1, ?2, ?3);",
    )?;
    let herd_uuid = herd_id.to_string();
    for (position, member_id) in member_ids.iter().enumerate() {
        stmt.execute(params![
            herd_uuid.as_str(),
            member_id.to_string(),
            position as i64
        ])?;
    }
    Ok(())
}

fn load_member_ids(conn: &Connection, herd_id: HerdId) -> RepoResult<Vec<UserId>> {
    let mut stmt = conn.prepare(
        "SELECT member_uuid
         FROM herd_members
         WHERE herd_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([herd_id.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "herd_members.member_uuid")?);
    }
    Ok(ids)
}
