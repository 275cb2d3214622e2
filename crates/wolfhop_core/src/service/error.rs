//! Shared error type for all managers.
//!
//! # Invariants
//! - Every variant maps to exactly one [`ErrorKind`]; transports map kinds to
//!   status codes and never inspect variants.
//! - `Display` text is safe to return to callers; store failures only expose
//!   their detail through `source()`.

use crate::identity::IdentityError;
use crate::repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Record collection named by a not-found failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Herd,
    Reflection,
    Notification,
}

impl Entity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Herd => "Herd",
            Self::Reflection => "Reflection",
            Self::Notification => "Notification",
        }
    }
}

/// Caller-facing failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Validation,
    Unauthenticated,
    Internal,
}

#[derive(Debug)]
pub enum ServiceError {
    NotFound(Entity, Uuid),
    /// Login email has no account.
    AccountNotFound,
    /// A herd member email did not resolve to a user.
    MemberNotFound(String),
    Forbidden(&'static str),
    SelfReference,
    AlreadyFriends,
    OwnerCannotLeave,
    DuplicateReaction,
    EmailTaken,
    InvalidInput(String),
    InvalidCredentials,
    Unauthenticated,
    Identity(IdentityError),
    Repo(RepoError),
}

impl ServiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(..) | Self::AccountNotFound | Self::MemberNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::SelfReference
            | Self::AlreadyFriends
            | Self::OwnerCannotLeave
            | Self::DuplicateReaction
            | Self::EmailTaken
            | Self::InvalidInput(_) => ErrorKind::Validation,
            Self::InvalidCredentials | Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::Identity(IdentityError::Expired | IdentityError::InvalidCredential) => {
                ErrorKind::Unauthenticated
            }
            Self::Identity(_) | Self::Repo(_) => ErrorKind::Internal,
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(entity, _) => write!(f, "{} not found", entity.as_str()),
            Self::AccountNotFound => write!(f, "User not found"),
            Self::MemberNotFound(email) => write!(f, "User with email {email} not found"),
            Self::Forbidden(reason) => write!(f, "{reason}"),
            Self::SelfReference => write!(f, "You cannot add yourself as a friend"),
            Self::AlreadyFriends => write!(f, "User is already your friend"),
            Self::OwnerCannotLeave => write!(
                f,
                "Owner cannot leave the herd, please delete it instead"
            ),
            Self::DuplicateReaction => write!(f, "User has already reacted to this reflection"),
            Self::EmailTaken => write!(f, "Email already registered"),
            Self::InvalidInput(message) => write!(f, "{message}"),
            Self::InvalidCredentials => write!(f, "Incorrect password"),
            Self::Unauthenticated => write!(f, "Could not validate credentials"),
            Self::Identity(IdentityError::Expired | IdentityError::InvalidCredential) => {
                write!(f, "Could not validate credentials")
            }
            Self::Identity(_) | Self::Repo(_) => write!(f, "Internal server error"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Identity(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<IdentityError> for ServiceError {
    fn from(value: IdentityError) -> Self {
        Self::Identity(value)
    }
}
