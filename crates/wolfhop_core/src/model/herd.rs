//! Herd (named user group) record.
//!
//! # Invariants
//! - `owner_id` is the creator and never changes.
//! - `member_ids` holds no duplicates; order is insertion order.
//! - At creation `owner_id` is always a member.

use uuid::Uuid;

use super::now_epoch_ms;
use super::user::{User, UserId};

pub type HerdId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Herd {
    pub id: HerdId,
    pub name: String,
    pub owner_id: UserId,
    pub member_ids: Vec<UserId>,
    pub created_at: i64,
}

impl Herd {
    /// Builds a herd with a generated id. The owner is appended to
    /// `member_ids` when absent and duplicate members are dropped.
    pub fn new(name: impl Into<String>, owner_id: UserId, member_ids: Vec<UserId>) -> Self {
        let mut members = dedup_members(member_ids);
        if !members.contains(&owner_id) {
            members.push(owner_id);
        }
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            owner_id,
            member_ids: members,
            created_at: now_epoch_ms(),
        }
    }

    pub fn is_member(&self, user_id: UserId) -> bool {
        self.member_ids.contains(&user_id)
    }

    pub fn is_owner(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }
}

/// Herd joined with its resolved member accounts. Built at read time only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HerdWithMembers {
    pub herd: Herd,
    pub members: Vec<User>,
}

/// Drops repeated ids, keeping the first occurrence.
pub fn dedup_members(member_ids: Vec<UserId>) -> Vec<UserId> {
    let mut unique = Vec::with_capacity(member_ids.len());
    for id in member_ids {
        if !unique.contains(&id) {
            unique.push(id);
        }
    }
    unique
}

#[cfg(test)]
mod tests {
    use super::Herd;
    use uuid::Uuid;

    #[test]
    fn new_herd_always_contains_owner_once() {
        let owner = Uuid::new_v4();
        let other = Uuid::new_v4();

        let herd = Herd::new("Team", owner, vec![other, other]);
        assert_eq!(herd.member_ids, vec![other, owner]);

        let herd = Herd::new("Team", owner, vec![owner, other]);
        assert_eq!(herd.member_ids, vec![owner, other]);
        assert!(herd.is_owner(owner));
        assert!(herd.is_member(other));
    }
}
