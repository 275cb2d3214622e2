//! Reflection and reaction repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Persist reflections with their single share target.
//! - Persist reactions and the ordered per-reflection reaction list.
//!
//! # Invariants
//! - `shared_with_id` is NULL iff `shared_with_type = 'self'` (schema CHECK).
//! - `record_reaction` inserts the reaction and appends it to the reflection
//!   list in one transaction; a second reaction by the same user maps to
//!   `RepoError::Conflict`.

use super::{
    ensure_connection_ready, is_unique_violation, parse_uuid, placeholders, RepoError,
    RepoResult,
};
use crate::model::reflection::{
    Reaction, ReactionId, Reflection, ReflectionId, ShareKind, ShareTarget,
};
use crate::model::user::UserId;
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::collections::HashMap;
use uuid::Uuid;

const REFLECTION_SELECT_SQL: &str = "SELECT
    uuid,
    author_uuid,
    high_text,
    low_text,
    buffalo_text,
    shared_with_type,
    shared_with_id,
    created_at
FROM reflections";

const REACTION_SELECT_SQL: &str = "SELECT
    uuid,
    reflection_uuid,
    user_uuid,
    reaction_type,
    created_at
FROM reactions";

/// Repository interface for reflections and their reactions.
pub trait ReflectionRepository {
    fn create_reflection(&self, reflection: &Reflection) -> RepoResult<ReflectionId>;
    fn get_reflection(&self, id: ReflectionId) -> RepoResult<Option<Reflection>>;
    /// Reflections written by `author_id`, oldest first.
    fn list_reflections_by_author(&self, author_id: UserId) -> RepoResult<Vec<Reflection>>;
    /// Reflections of share kind `kind` whose target id is in `target_ids`,
    /// oldest first.
    fn list_reflections_shared_with(
        &self,
        kind: ShareKind,
        target_ids: &[Uuid],
    ) -> RepoResult<Vec<Reflection>>;
    fn find_reaction(
        &self,
        reflection_id: ReflectionId,
        user_id: UserId,
    ) -> RepoResult<Option<Reaction>>;
    /// Membership query; results follow the order of `ids`, unknown ids are
    /// skipped.
    fn list_reactions_by_ids(&self, ids: &[ReactionId]) -> RepoResult<Vec<Reaction>>;
    /// Inserts `reaction` and appends its id to the target reflection's list.
    fn record_reaction(&self, reaction: &Reaction) -> RepoResult<ReactionId>;
}

/// SQLite-backed reflection repository.
#[derive(Clone, Copy)]
pub struct SqliteReflectionRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteReflectionRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }

    fn query_reflections(&self, sql: &str, bind_values: Vec<Value>) -> RepoResult<Vec<Reflection>> {
        let mut stmt = self.conn.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut raws = Vec::new();
        while let Some(row) = rows.next()? {
            raws.push(RawReflection::from_row(row)?);
        }
        raws.into_iter()
            .map(|raw| self.load_reflection(raw))
            .collect()
    }

    fn load_reflection(&self, raw: RawReflection) -> RepoResult<Reflection> {
        let id = parse_uuid(&raw.uuid, "reflections.uuid")?;
        let share = ShareTarget::from_parts(&raw.shared_with_type, raw.shared_with_id.as_deref())
            .map_err(|err| {
                RepoError::InvalidData(format!("reflection {id} has invalid share target: {err}"))
            })?;

        Ok(Reflection {
            id,
            author_id: parse_uuid(&raw.author_uuid, "reflections.author_uuid")?,
            high_text: raw.high_text,
            low_text: raw.low_text,
            buffalo_text: raw.buffalo_text,
            share,
            reaction_ids: load_reaction_ids(self.conn, id)?,
            created_at: raw.created_at,
        })
    }
}

impl ReflectionRepository for SqliteReflectionRepository<'_> {
    fn create_reflection(&self, reflection: &Reflection) -> RepoResult<ReflectionId> {
        self.conn.execute(
            "INSERT INTO reflections (
                uuid,
                author_uuid,
                high_text,
                low_text,
                buffalo_text,
                shared_with_type,
                shared_with_id,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                reflection.id.to_string(),
                reflection.author_id.to_string(),
                reflection.high_text.as_str(),
                reflection.low_text.as_str(),
                reflection.buffalo_text.as_str(),
                reflection.share.kind().as_str(),
                reflection.share.target_id().map(|id| id.to_string()),
                reflection.created_at,
            ],
        )?;
        Ok(reflection.id)
    }

    fn get_reflection(&self, id: ReflectionId) -> RepoResult<Option<Reflection>> {
        let raw = self
            .conn
            .query_row(
                &format!("{REFLECTION_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                |row| RawReflection::from_row(row),
            )
            .optional()?;
        raw.map(|raw| self.load_reflection(raw)).transpose()
    }

    fn list_reflections_by_author(&self, author_id: UserId) -> RepoResult<Vec<Reflection>> {
        self.query_reflections(
            &format!(
                "{REFLECTION_SELECT_SQL}
                 WHERE author_uuid = ?
                 ORDER BY created_at ASC, rowid ASC;"
            ),
            vec![Value::Text(author_id.to_string())],
        )
    }

    fn list_reflections_shared_with(
        &self,
        kind: ShareKind,
        target_ids: &[Uuid],
    ) -> RepoResult<Vec<Reflection>> {
        if target_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut bind_values = vec![Value::Text(kind.as_str().to_string())];
        bind_values.extend(target_ids.iter().map(|id| Value::Text(id.to_string())));
        self.query_reflections(
            &format!(
                "{REFLECTION_SELECT_SQL}
                 WHERE shared_with_type = ?
                   AND shared_with_id IN ({})
                 ORDER BY created_at ASC, rowid ASC;",
                placeholders(target_ids.len())
            ),
            bind_values,
        )
    }

    fn find_reaction(
        &self,
        reflection_id: ReflectionId,
        user_id: UserId,
    ) -> RepoResult<Option<Reaction>> {
        let raw = self
            .conn
            .query_row(
                &format!("{REACTION_SELECT_SQL} WHERE reflection_uuid = ?1 AND user_uuid = ?2;"),
                params![reflection_id.to_string(), user_id.to_string()],
                |row| RawReaction::from_row(row),
            )
            .optional()?;
        raw.map(RawReaction::into_reaction).transpose()
    }

    fn list_reactions_by_ids(&self, ids: &[ReactionId]) -> RepoResult<Vec<Reaction>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let sql = format!(
            "{REACTION_SELECT_SQL} WHERE uuid IN ({});",
            placeholders(ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(ids.iter().map(|id| id.to_string())))?;
        let mut by_id = HashMap::new();
        while let Some(row) = rows.next()? {
            let reaction = RawReaction::from_row(row)?.into_reaction()?;
            by_id.insert(reaction.id, reaction);
        }

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }

    fn record_reaction(&self, reaction: &Reaction) -> RepoResult<ReactionId> {
        let tx = self.conn.unchecked_transaction()?;
        let reflection_uuid = reaction.reflection_id.to_string();

        let exists = tx
            .query_row(
                "SELECT 1 FROM reflections WHERE uuid = ?1;",
                [reflection_uuid.as_str()],
                |row| row.get::<_, i64>(0),
            )
            .optional()?
            .is_some();
        if !exists {
            return Err(RepoError::NotFound(reaction.reflection_id));
        }

        tx.execute(
            "INSERT INTO reactions (
                uuid,
                reflection_uuid,
                user_uuid,
                reaction_type,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                reaction.id.to_string(),
                reflection_uuid.as_str(),
                reaction.user_id.to_string(),
                reaction.reaction_type.as_str(),
                reaction.created_at,
            ],
        )
        .map_err(|err| {
            if is_unique_violation(&err) {
                RepoError::Conflict("reactions.reflection_uuid+user_uuid")
            } else {
                err.into()
            }
        })?;

        tx.execute(
            "INSERT INTO reflection_reactions (reflection_uuid, reaction_uuid, position)
             SELECT ?1, ?2, COALESCE(MAX(position) + 1, 0)
             FROM reflection_reactions
             WHERE reflection_uuid = ?1;",
            params![reflection_uuid.as_str(), reaction.id.to_string()],
        )?;

        tx.commit()?;
        Ok(reaction.id)
    }
}

struct RawReflection {
    uuid: String,
    author_uuid: String,
    high_text: String,
    low_text: String,
    buffalo_text: String,
    shared_with_type: String,
    shared_with_id: Option<String>,
    created_at: i64,
}

impl RawReflection {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            uuid: row.get("uuid")?,
            author_uuid: row.get("author_uuid")?,
            high_text: row.get("high_text")?,
            low_text: row.get("low_text")?,
            buffalo_text: row.get("buffalo_text")?,
            shared_with_type: row.get("shared_with_type")?,
            shared_with_id: row.get("shared_with_id")?,
            created_at: row.get("created_at")?,
        })
    }
}

struct RawReaction {
    uuid: String,
    reflection_uuid: String,
    user_uuid: String,
    reaction_type: String,
    created_at: i64,
}

impl RawReaction {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            uuid: row.get("uuid")?,
            reflection_uuid: row.get("reflection_uuid")?,
            user_uuid: row.get("user_uuid")?,
            reaction_type: row.get("reaction_type")?,
            created_at: row.get("created_at")?,
        })
    }

    fn into_reaction(self) -> RepoResult<Reaction> {
        Ok(Reaction {
            id: parse_uuid(&self.uuid, "reactions.uuid")?,
            reflection_id: parse_uuid(&self.reflection_uuid, "reactions.reflection_uuid")?,
            user_id: parse_uuid(&self.user_uuid, "reactions.user_uuid")?,
            reaction_type: self.reaction_type,
            created_at: self.created_at,
        })
    }
}

fn load_reaction_ids(conn: &Connection, reflection_id: ReflectionId) -> RepoResult<Vec<ReactionId>> {
    let mut stmt = conn.prepare(
        "SELECT reaction_uuid
         FROM reflection_reactions
         WHERE reflection_uuid = ?1
         ORDER BY position ASC;",
    )?;
    let mut rows = stmt.query([reflection_id.to_string()])?;
    let mut ids = Vec::new();
    while let Some(row) = rows.next()? {
        let value: String = row.get(0)?;
        ids.push(parse_uuid(&value, "reflection_reactions.reaction_uuid")?);
    }
    Ok(ids)
}
