//! Account use-cases: signup, login, credential authentication, profile.
//!
//! # Invariants
//! - Passwords are stored only as argon2 PHC hashes.
//! - Every authentication failure is reported uniformly as `Unauthenticated`.

use super::error::{Entity, ServiceError, ServiceResult};
use crate::identity::{hash_password, verify_password, IdentityProvider};
use crate::model::user::{is_plausible_email, User, UserId};
use crate::repo::user_repo::UserRepository;
use crate::repo::RepoError;
use log::{debug, info};

pub struct AccountService<U: UserRepository, I: IdentityProvider> {
    users: U,
    identity: I,
}

impl<U: UserRepository, I: IdentityProvider> AccountService<U, I> {
    pub fn new(users: U, identity: I) -> Self {
        Self { users, identity }
    }

    /// Registers a new account and returns a bearer credential for it.
    ///
    /// # Errors
    /// - `InvalidInput` for a blank display name, malformed email, or empty
    ///   password.
    /// - `EmailTaken` when the normalized email already has an account.
    pub fn signup(&self, display_name: &str, email: &str, password: &str) -> ServiceResult<String> {
        if display_name.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "displayName cannot be empty".to_string(),
            ));
        }
        if !is_plausible_email(email) {
            return Err(ServiceError::InvalidInput(
                "email is not a valid address".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(ServiceError::InvalidInput(
                "password cannot be empty".to_string(),
            ));
        }
        if self.users.find_user_by_email(email)?.is_some() {
            return Err(ServiceError::EmailTaken);
        }

        let user = User::new(display_name, email, hash_password(password)?);
        self.users.create_user(&user).map_err(|err| match err {
            RepoError::Conflict(_) => ServiceError::EmailTaken,
            other => other.into(),
        })?;

        info!(
            "event=account_signup module=service status=ok user_id={}",
            user.id
        );
        Ok(self.identity.issue(user.id)?)
    }

    /// Exchanges email and password for a bearer credential.
    pub fn login(&self, email: &str, password: &str) -> ServiceResult<String> {
        let user = self
            .users
            .find_user_by_email(email)?
            .ok_or(ServiceError::AccountNotFound)?;
        if !verify_password(password, &user.password_hash)? {
            info!(
                "event=account_login module=service status=error user_id={} reason=bad_password",
                user.id
            );
            return Err(ServiceError::InvalidCredentials);
        }
        Ok(self.identity.issue(user.id)?)
    }

    /// Resolves a bearer credential to an existing user.
    pub fn authenticate(&self, credential: &str) -> ServiceResult<User> {
        let user_id = self.identity.verify(credential).map_err(|err| {
            debug!(
                "event=authenticate module=service status=error error={}",
                err
            );
            ServiceError::Unauthenticated
        })?;
        self.users
            .get_user(user_id)?
            .ok_or(ServiceError::Unauthenticated)
    }

    pub fn me(&self, user_id: UserId) -> ServiceResult<User> {
        self.users
            .get_user(user_id)?
            .ok_or(ServiceError::NotFound(Entity::User, user_id))
    }

    /// Updates display name and/or password; blank values are ignored.
    pub fn update_profile(
        &self,
        user_id: UserId,
        display_name: Option<&str>,
        password: Option<&str>,
    ) -> ServiceResult<User> {
        let mut user = self.me(user_id)?;
        if let Some(name) = display_name.map(str::trim).filter(|name| !name.is_empty()) {
            user.display_name = name.to_string();
        }
        if let Some(password) = password.filter(|password| !password.is_empty()) {
            user.password_hash = hash_password(password)?;
        }
        self.users.update_user(&user)?;
        info!(
            "event=account_update module=service status=ok user_id={}",
            user_id
        );
        Ok(user)
    }

    pub fn list_users(&self) -> ServiceResult<Vec<User>> {
        Ok(self.users.list_users()?)
    }

    pub fn find_by_email(&self, email: &str) -> ServiceResult<User> {
        self.users
            .find_user_by_email(email)?
            .ok_or(ServiceError::AccountNotFound)
    }
}
