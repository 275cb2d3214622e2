//! Friend list record: one per user, lazily created.

use super::user::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FriendList {
    pub user_id: UserId,
    /// Ordered by the time each friend was added.
    pub friend_ids: Vec<UserId>,
}

impl FriendList {
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            friend_ids: Vec::new(),
        }
    }

    pub fn contains(&self, friend_id: UserId) -> bool {
        self.friend_ids.contains(&friend_id)
    }
}
