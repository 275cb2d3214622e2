//! Friend graph use-cases.
//!
//! # Responsibility
//! - Maintain the symmetric-on-add friend relation.
//! - Resolve friend ids to user records for callers.
//!
//! # Invariants
//! - A user is never in their own friend list.
//! - Add writes both directions; the reciprocal write is idempotent.
//! - Remove only touches the requester's list.

use super::error::{Entity, ServiceError, ServiceResult};
use super::notifier::NotificationEmitter;
use crate::model::notification::NOTIFICATION_FRIEND_REQUEST;
use crate::model::user::{User, UserId};
use crate::repo::friend_repo::FriendRepository;
use crate::repo::user_repo::UserRepository;
use log::info;

/// Friend graph facade.
pub struct FriendService<U: UserRepository, F: FriendRepository, N: NotificationEmitter> {
    users: U,
    friends: F,
    notifier: N,
}

impl<U: UserRepository, F: FriendRepository, N: NotificationEmitter> FriendService<U, F, N> {
    pub fn new(users: U, friends: F, notifier: N) -> Self {
        Self {
            users,
            friends,
            notifier,
        }
    }

    /// Adds `target_id` as a friend of `requester_id` and vice versa.
    ///
    /// Emits a `friend_request` notification to the target when `notify` is
    /// set. Returns the requester's friends in list order.
    ///
    /// # Errors
    /// - `SelfReference` when both ids are equal.
    /// - `NotFound(User)` when either user does not exist.
    /// - `AlreadyFriends` when the target is already in the requester's list.
    pub fn add_friend(
        &self,
        requester_id: UserId,
        target_id: UserId,
        notify: bool,
    ) -> ServiceResult<Vec<User>> {
        if requester_id == target_id {
            return Err(ServiceError::SelfReference);
        }
        let requester = self
            .users
            .get_user(requester_id)?
            .ok_or(ServiceError::NotFound(Entity::User, requester_id))?;
        if self.users.get_user(target_id)?.is_none() {
            return Err(ServiceError::NotFound(Entity::User, target_id));
        }

        let list = self.friends.ensure_friend_list(requester_id)?;
        if list.contains(target_id) || !self.friends.append_friend(requester_id, target_id)? {
            return Err(ServiceError::AlreadyFriends);
        }
        self.friends.append_friend(target_id, requester_id)?;

        info!(
            "event=friend_add module=service status=ok requester_id={} target_id={}",
            requester_id, target_id
        );

        if notify {
            self.notifier.emit(
                requester_id,
                target_id,
                NOTIFICATION_FRIEND_REQUEST,
                &format!("You have a new friend request from {}", requester.email),
            );
        }

        self.list_friends(requester_id)
    }

    /// Removes `target_id` from the requester's list only.
    ///
    /// Returns whether an entry was removed; a missing list or entry is not
    /// an error.
    pub fn remove_friend(&self, requester_id: UserId, target_id: UserId) -> ServiceResult<bool> {
        if self.friends.get_friend_list(requester_id)?.is_none() {
            return Ok(false);
        }
        let removed = self.friends.remove_friend(requester_id, target_id)?;
        if removed {
            info!(
                "event=friend_remove module=service status=ok requester_id={} target_id={}",
                requester_id, target_id
            );
        }
        Ok(removed)
    }

    /// Friends of `user_id` in the order they were added.
    pub fn list_friends(&self, user_id: UserId) -> ServiceResult<Vec<User>> {
        match self.friends.get_friend_list(user_id)? {
            Some(list) => Ok(self.users.list_users_by_ids(&list.friend_ids)?),
            None => Ok(Vec::new()),
        }
    }
}
