//! Notification record produced as a side effect of social actions.
//!
//! # Invariants
//! - Only `read` changes after creation.

use uuid::Uuid;

use super::now_epoch_ms;
use super::user::UserId;

pub type NotificationId = Uuid;

/// Emitted to the target of a friend add.
pub const NOTIFICATION_FRIEND_REQUEST: &str = "friend_request";
/// Emitted to each recipient of a shared reflection.
pub const NOTIFICATION_REFLECTION_SHARED: &str = "reflection_shared";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub id: NotificationId,
    pub sender_id: UserId,
    pub recipient_id: UserId,
    /// Free-form tag; serialized as `type`.
    pub kind: String,
    pub message: String,
    pub read: bool,
    pub created_at: i64,
}

impl Notification {
    pub fn new(
        sender_id: UserId,
        recipient_id: UserId,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender_id,
            recipient_id,
            kind: kind.into(),
            message: message.into(),
            read: false,
            created_at: now_epoch_ms(),
        }
    }
}
