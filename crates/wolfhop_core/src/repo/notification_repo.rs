//! Notification repository contract and SQLite implementation.
//!
//! # Invariants
//! - Notifications reference existing sender and recipient users.
//! - Only `is_read` is mutable after insert.

use super::{bool_to_int, ensure_connection_ready, parse_uuid, RepoError, RepoResult};
use crate::model::notification::{Notification, NotificationId};
use crate::model::user::UserId;
use rusqlite::{params, Connection, OptionalExtension, Row};

const NOTIFICATION_SELECT_SQL: &str = "SELECT
    uuid,
    sender_uuid,
    recipient_uuid,
    type,
    message,
    is_read,
    created_at
FROM notifications";

/// Repository interface for per-recipient notifications.
pub trait NotificationRepository {
    fn create_notification(&self, notification: &Notification) -> RepoResult<NotificationId>;
    fn get_notification(&self, id: NotificationId) -> RepoResult<Option<Notification>>;
    /// Oldest first.
    fn list_notifications_for_recipient(
        &self,
        recipient_id: UserId,
    ) -> RepoResult<Vec<Notification>>;
    fn mark_notification_read(&self, id: NotificationId, read: bool) -> RepoResult<()>;
    fn delete_notification(&self, id: NotificationId) -> RepoResult<()>;
}

/// SQLite-backed notification repository.
#[derive(Clone, Copy)]
pub struct SqliteNotificationRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteNotificationRepository<'conn> {
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl NotificationRepository for SqliteNotificationRepository<'_> {
    fn create_notification(&self, notification: &Notification) -> RepoResult<NotificationId> {
        self.conn.execute(
            "INSERT INTO notifications (
                uuid,
                sender_uuid,
                recipient_uuid,
                type,
                message,
                is_read,
                created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                notification.id.to_string(),
                notification.sender_id.to_string(),
                notification.recipient_id.to_string(),
                notification.kind.as_str(),
                notification.message.as_str(),
                bool_to_int(notification.read),
                notification.created_at,
            ],
        )?;
        Ok(notification.id)
    }

    fn get_notification(&self, id: NotificationId) -> RepoResult<Option<Notification>> {
        let raw = self
            .conn
            .query_row(
                &format!("{NOTIFICATION_SELECT_SQL} WHERE uuid = ?1;"),
                [id.to_string()],
                |row| RawNotification::from_row(row),
            )
            .optional()?;
        raw.map(RawNotification::into_notification).transpose()
    }

    fn list_notifications_for_recipient(
        &self,
        recipient_id: UserId,
    ) -> RepoResult<Vec<Notification>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NOTIFICATION_SELECT_SQL}
             WHERE recipient_uuid = ?1
             ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([recipient_id.to_string()])?;
        let mut notifications = Vec::new();
        while let Some(row) = rows.next()? {
            notifications.push(RawNotification::from_row(row)?.into_notification()?);
        }
        Ok(notifications)
    }

    fn mark_notification_read(&self, id: NotificationId, read: bool) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE notifications SET is_read = ?2 WHERE uuid = ?1;",
            params![id.to_string(), bool_to_int(read)],
        )?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }

    fn delete_notification(&self, id: NotificationId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM notifications WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }
        Ok(())
    }
}

struct RawNotification {
    uuid: String,
    sender_uuid: String,
    recipient_uuid: String,
    kind: String,
    message: String,
    is_read: i64,
    created_at: i64,
}

impl RawNotification {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            uuid: row.get("uuid")?,
            sender_uuid: row.get("sender_uuid")?,
            recipient_uuid: row.get("recipient_uuid")?,
            kind: row.get("type")?,
            message: row.get("message")?,
            is_read: row.get("is_read")?,
            created_at: row.get("created_at")?,
        })
    }

    fn into_notification(self) -> RepoResult<Notification> {
        Ok(Notification {
            id: parse_uuid(&self.uuid, "notifications.uuid")?,
            sender_id: parse_uuid(&self.sender_uuid, "notifications.sender_uuid")?,
            recipient_id: parse_uuid(&self.recipient_uuid, "notifications.recipient_uuid")?,
            kind: self.kind,
            message: self.message,
            read: self.is_read != 0,
            created_at: self.created_at,
        })
    }
}
