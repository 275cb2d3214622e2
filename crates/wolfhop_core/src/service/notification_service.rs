//! Notification inbox use-cases.

use super::error::{Entity, ServiceError, ServiceResult};
use crate::model::notification::{Notification, NotificationId};
use crate::model::user::UserId;
use crate::repo::notification_repo::NotificationRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;

const NOT_RECIPIENT: &str = "User is not the recipient of this notification";
const NOT_PARTICIPANT: &str = "User is not authorized to delete this notification";

pub struct NotificationService<U: UserRepository, R: NotificationRepository> {
    users: U,
    notifications: R,
}

impl<U: UserRepository, R: NotificationRepository> NotificationService<U, R> {
    pub fn new(users: U, notifications: R) -> Self {
        Self {
            users,
            notifications,
        }
    }

    /// Notifications addressed to `recipient_id`, oldest first.
    pub fn list(&self, recipient_id: UserId) -> ServiceResult<Vec<Notification>> {
        Ok(self
            .notifications
            .list_notifications_for_recipient(recipient_id)?)
    }

    /// Explicitly sends a notification from `sender_id`.
    pub fn send(
        &self,
        sender_id: UserId,
        recipient_id: UserId,
        kind: &str,
        message: &str,
    ) -> ServiceResult<Notification> {
        let kind = kind.trim();
        if kind.is_empty() {
            return Err(ServiceError::InvalidInput(
                "Notification type cannot be empty".to_string(),
            ));
        }
        if message.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "Notification message cannot be empty".to_string(),
            ));
        }
        if self.users.get_user(recipient_id)?.is_none() {
            return Err(ServiceError::NotFound(Entity::User, recipient_id));
        }

        let notification = Notification::new(sender_id, recipient_id, kind, message);
        self.notifications.create_notification(&notification)?;
        Ok(notification)
    }

    pub fn mark_read(&self, notification_id: NotificationId, user_id: UserId) -> ServiceResult<()> {
        let notification = self.load(notification_id)?;
        if notification.recipient_id != user_id {
            return Err(ServiceError::Forbidden(NOT_RECIPIENT));
        }
        self.notifications
            .mark_notification_read(notification_id, true)
            .map_err(|err| not_found_as_notification(err, notification_id))
    }

    /// Deletes a notification; allowed for its recipient or sender.
    pub fn delete(&self, notification_id: NotificationId, user_id: UserId) -> ServiceResult<()> {
        let notification = self.load(notification_id)?;
        if notification.recipient_id != user_id && notification.sender_id != user_id {
            return Err(ServiceError::Forbidden(NOT_PARTICIPANT));
        }
        self.notifications
            .delete_notification(notification_id)
            .map_err(|err| not_found_as_notification(err, notification_id))
    }

    fn load(&self, notification_id: NotificationId) -> ServiceResult<Notification> {
        self.notifications
            .get_notification(notification_id)?
            .ok_or(ServiceError::NotFound(Entity::Notification, notification_id))
    }
}

fn not_found_as_notification(err: RepoError, notification_id: NotificationId) -> ServiceError {
    match err {
        RepoError::NotFound(_) => ServiceError::NotFound(Entity::Notification, notification_id),
        other => other.into(),
    }
}
