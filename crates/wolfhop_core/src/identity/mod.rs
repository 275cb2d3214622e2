//! Identity provider contract: credential issue/verify and password hashing.
//!
//! # Responsibility
//! - Map an inbound bearer credential to a user id.
//! - Hash and verify account passwords.
//!
//! # Invariants
//! - Secrets are injected at construction; nothing here reads the environment.
//! - Credentials and passwords never appear in log lines or error messages.

use crate::model::user::UserId;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password};
pub use token::JwtIdentityProvider;

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Issues and verifies bearer credentials.
pub trait IdentityProvider {
    fn issue(&self, user_id: UserId) -> IdentityResult<String>;
    fn verify(&self, credential: &str) -> IdentityResult<UserId>;
}

impl<T: IdentityProvider + ?Sized> IdentityProvider for &T {
    fn issue(&self, user_id: UserId) -> IdentityResult<String> {
        (**self).issue(user_id)
    }

    fn verify(&self, credential: &str) -> IdentityResult<UserId> {
        (**self).verify(credential)
    }
}

#[derive(Debug)]
pub enum IdentityError {
    /// Provider configuration is unusable (e.g. secret too short).
    Config(String),
    /// Password hashing backend failure or unreadable stored hash.
    Hashing(String),
    Expired,
    /// Signature, format, or subject check failed.
    InvalidCredential,
    Token(jsonwebtoken::errors::Error),
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(message) => write!(f, "identity configuration error: {message}"),
            Self::Hashing(message) => write!(f, "password hashing failed: {message}"),
            Self::Expired => write!(f, "credential expired"),
            Self::InvalidCredential => write!(f, "credential invalid"),
            Self::Token(err) => write!(f, "token encoding failed: {err}"),
        }
    }
}

impl Error for IdentityError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Token(err) => Some(err),
            _ => None,
        }
    }
}
