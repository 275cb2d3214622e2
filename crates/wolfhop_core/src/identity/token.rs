//! HS256 bearer tokens.
//!
//! Claims carry the user id as `sub` plus `iat`/`exp` in Unix seconds.
//! Validation uses zero leeway.

use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use super::{IdentityError, IdentityProvider, IdentityResult};
use crate::model::user::UserId;

/// Minimum accepted signing secret length.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Claims {
    sub: String,
    iat: u64,
    exp: u64,
}

/// Identity provider backed by HS256-signed JWTs.
#[derive(Clone)]
pub struct JwtIdentityProvider {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: u64,
}

impl JwtIdentityProvider {
    /// Builds a provider; tokens expire `ttl_minutes` after issue.
    ///
    /// # Errors
    /// - `Config` when `secret` is empty or shorter than [`MIN_SECRET_LEN`].
    /// - `Config` when `ttl_minutes` is zero.
    pub fn new(secret: &str, ttl_minutes: u64) -> IdentityResult<Self> {
        if secret.is_empty() {
            return Err(IdentityError::Config("JWT_SECRET is required".to_string()));
        }
        if secret.len() < MIN_SECRET_LEN {
            return Err(IdentityError::Config(format!(
                "JWT_SECRET must be at least {MIN_SECRET_LEN} characters"
            )));
        }
        if ttl_minutes == 0 {
            return Err(IdentityError::Config(
                "token lifetime must be at least one minute".to_string(),
            ));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds: ttl_minutes.saturating_mul(60),
        })
    }

    fn issue_at(&self, user_id: UserId, issued_at: u64) -> IdentityResult<String> {
        let claims = Claims {
            sub: user_id.to_string(),
            iat: issued_at,
            exp: issued_at.saturating_add(self.ttl_seconds),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(IdentityError::Token)
    }
}

impl IdentityProvider for JwtIdentityProvider {
    fn issue(&self, user_id: UserId) -> IdentityResult<String> {
        self.issue_at(user_id, unix_now()?)
    }

    fn verify(&self, credential: &str) -> IdentityResult<UserId> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let data = decode::<Claims>(credential.trim(), &self.decoding_key, &validation).map_err(
            |err| match err.kind() {
                JwtErrorKind::ExpiredSignature => IdentityError::Expired,
                _ => IdentityError::InvalidCredential,
            },
        )?;
        Uuid::parse_str(&data.claims.sub).map_err(|_| IdentityError::InvalidCredential)
    }
}

fn unix_now() -> IdentityResult<u64> {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .map_err(|err| IdentityError::Config(format!("system clock before unix epoch: {err}")))
}

#[cfg(test)]
mod tests {
    use super::{unix_now, JwtIdentityProvider};
    use crate::identity::{IdentityError, IdentityProvider};
    use uuid::Uuid;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    #[test]
    fn issued_token_verifies_to_same_user() {
        let provider = JwtIdentityProvider::new(SECRET, 60).unwrap();
        let user_id = Uuid::new_v4();
        let token = provider.issue(user_id).unwrap();
        assert_eq!(provider.verify(&token).unwrap(), user_id);
    }

    #[test]
    fn short_or_empty_secret_is_rejected() {
        assert!(matches!(
            JwtIdentityProvider::new("", 60),
            Err(IdentityError::Config(_))
        ));
        assert!(matches!(
            JwtIdentityProvider::new("too-short", 60),
            Err(IdentityError::Config(_))
        ));
    }

    #[test]
    fn token_signed_with_other_secret_is_invalid() {
        let issuer = JwtIdentityProvider::new(SECRET, 60).unwrap();
        let verifier =
            JwtIdentityProvider::new("ffffffffffffffffffffffffffffffff", 60).unwrap();
        let token = issuer.issue(Uuid::new_v4()).unwrap();
        assert!(matches!(
            verifier.verify(&token),
            Err(IdentityError::InvalidCredential)
        ));
        assert!(matches!(
            verifier.verify("garbage"),
            Err(IdentityError::InvalidCredential)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let provider = JwtIdentityProvider::new(SECRET, 1).unwrap();
        let two_hours_ago = unix_now().unwrap() - 2 * 60 * 60;
        let token = provider.issue_at(Uuid::new_v4(), two_hours_ago).unwrap();
        assert!(matches!(
            provider.verify(&token),
            Err(IdentityError::Expired)
        ));
    }
}
