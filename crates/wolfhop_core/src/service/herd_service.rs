//! Herd membership use-cases.
//!
//! # Responsibility
//! - Create, read, update, delete, and leave herds with owner/member checks.
//! - Resolve member emails to user ids.
//!
//! # Invariants
//! - The owner is a member at creation and can never leave.
//! - Only the owner may update or delete.
//! - A membership replace does not re-add the owner.

use super::error::{Entity, ServiceError, ServiceResult};
use crate::model::herd::{dedup_members, Herd, HerdId, HerdWithMembers};
use crate::model::user::UserId;
use crate::repo::herd_repo::HerdRepository;
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use log::info;

const NOT_A_MEMBER: &str = "User is not a member of this herd";
const NOT_THE_OWNER: &str = "User is not the owner of this herd";

/// Partial update for a herd. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HerdPatch {
    pub name: Option<String>,
    /// Full replacement member list; an empty list clears membership.
    pub member_emails: Option<Vec<String>>,
}

/// Herd facade.
pub struct HerdService<U: UserRepository, H: HerdRepository> {
    users: U,
    herds: H,
}

impl<U: UserRepository, H: HerdRepository> HerdService<U, H> {
    pub fn new(users: U, herds: H) -> Self {
        Self { users, herds }
    }

    /// Creates a herd owned by `owner_id`.
    ///
    /// # Errors
    /// - `InvalidInput` when `name` is blank.
    /// - `MemberNotFound` naming the first email without an account.
    pub fn create(
        &self,
        owner_id: UserId,
        name: &str,
        member_emails: &[String],
    ) -> ServiceResult<Herd> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::InvalidInput(
                "Herd name cannot be empty".to_string(),
            ));
        }

        let member_ids = self.resolve_member_emails(member_emails)?;
        let herd = Herd::new(name, owner_id, member_ids);
        self.herds.create_herd(&herd)?;

        info!(
            "event=herd_create module=service status=ok herd_id={} owner_id={} members={}",
            herd.id,
            owner_id,
            herd.member_ids.len()
        );
        Ok(herd)
    }

    /// Herds `user_id` belongs to, each joined with its member accounts.
    pub fn list(&self, user_id: UserId) -> ServiceResult<Vec<HerdWithMembers>> {
        self.herds
            .list_herds_for_member(user_id)?
            .into_iter()
            .map(|herd| {
                let members = self.users.list_users_by_ids(&herd.member_ids)?;
                Ok(HerdWithMembers { herd, members })
            })
            .collect()
    }

    pub fn get(&self, herd_id: HerdId, user_id: UserId) -> ServiceResult<Herd> {
        let herd = self.load(herd_id)?;
        if !herd.is_member(user_id) {
            return Err(ServiceError::Forbidden(NOT_A_MEMBER));
        }
        Ok(herd)
    }

    /// Applies `patch` to a herd owned by `user_id`.
    ///
    /// A blank name in the patch is ignored.
    pub fn update(&self, herd_id: HerdId, user_id: UserId, patch: HerdPatch) -> ServiceResult<Herd> {
        let mut herd = self.load_owned(herd_id, user_id)?;

        if let Some(name) = patch.name.as_deref().map(str::trim) {
            if !name.is_empty() {
                herd.name = name.to_string();
            }
        }
        if let Some(emails) = patch.member_emails.as_deref() {
            herd.member_ids = self.resolve_member_emails(emails)?;
        }

        self.replace(&herd)?;
        info!(
            "event=herd_update module=service status=ok herd_id={} members={}",
            herd.id,
            herd.member_ids.len()
        );
        Ok(herd)
    }

    pub fn delete(&self, herd_id: HerdId, user_id: UserId) -> ServiceResult<()> {
        self.load_owned(herd_id, user_id)?;
        self.herds.delete_herd(herd_id).map_err(|err| match err {
            RepoError::NotFound(id) => ServiceError::NotFound(Entity::Herd, id),
            other => other.into(),
        })?;
        info!(
            "event=herd_delete module=service status=ok herd_id={}",
            herd_id
        );
        Ok(())
    }

    /// Removes `user_id` from the herd's members.
    ///
    /// # Errors
    /// - `Forbidden` when not a member.
    /// - `OwnerCannotLeave` when `user_id` owns the herd.
    pub fn leave(&self, herd_id: HerdId, user_id: UserId) -> ServiceResult<()> {
        let mut herd = self.get(herd_id, user_id)?;
        if herd.is_owner(user_id) {
            return Err(ServiceError::OwnerCannotLeave);
        }
        herd.member_ids.retain(|member_id| *member_id != user_id);
        self.replace(&herd)?;
        info!(
            "event=herd_leave module=service status=ok herd_id={} user_id={}",
            herd_id, user_id
        );
        Ok(())
    }

    fn load(&self, herd_id: HerdId) -> ServiceResult<Herd> {
        self.herds
            .get_herd(herd_id)?
            .ok_or(ServiceError::NotFound(Entity::Herd, herd_id))
    }

    fn load_owned(&self, herd_id: HerdId, user_id: UserId) -> ServiceResult<Herd> {
        let herd = self.load(herd_id)?;
        if !herd.is_owner(user_id) {
            return Err(ServiceError::Forbidden(NOT_THE_OWNER));
        }
        Ok(herd)
    }

    fn replace(&self, herd: &Herd) -> ServiceResult<()> {
        self.herds.replace_herd(herd).map_err(|err| match err {
            RepoError::NotFound(id) => ServiceError::NotFound(Entity::Herd, id),
            other => other.into(),
        })
    }

    fn resolve_member_emails(&self, emails: &[String]) -> ServiceResult<Vec<UserId>> {
        let mut member_ids = Vec::with_capacity(emails.len());
        for email in emails {
            let user = self
                .users
                .find_user_by_email(email)?
                .ok_or_else(|| ServiceError::MemberNotFound(email.trim().to_string()))?;
            member_ids.push(user.id);
        }
        Ok(dedup_members(member_ids))
    }
}
