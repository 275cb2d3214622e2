//! Best-effort notification side effects.
//!
//! # Invariants
//! - `emit` never fails its caller; store failures are logged at `warn` and
//!   dropped.
//! - Log lines carry ids and the notification kind only, never the message.

use crate::model::notification::Notification;
use crate::model::user::UserId;
use crate::repo::notification_repo::NotificationRepository;
use log::{debug, warn};

/// Sink for notifications produced by social actions.
pub trait NotificationEmitter {
    fn emit(&self, sender_id: UserId, recipient_id: UserId, kind: &str, message: &str);
}

/// Emitter that persists into a notification repository.
pub struct StoreNotificationEmitter<R: NotificationRepository> {
    repo: R,
}

impl<R: NotificationRepository> StoreNotificationEmitter<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }
}

impl<R: NotificationRepository> NotificationEmitter for StoreNotificationEmitter<R> {
    fn emit(&self, sender_id: UserId, recipient_id: UserId, kind: &str, message: &str) {
        let notification = Notification::new(sender_id, recipient_id, kind, message);
        match self.repo.create_notification(&notification) {
            Ok(id) => debug!(
                "event=notification_emit module=service status=ok kind={} notification_id={} recipient_id={}",
                kind, id, recipient_id
            ),
            Err(err) => warn!(
                "event=notification_emit module=service status=error kind={} recipient_id={} error={}",
                kind, recipient_id, err
            ),
        }
    }
}
