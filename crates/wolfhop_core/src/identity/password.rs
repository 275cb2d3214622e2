//! Argon2id password hashing in PHC string format.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use super::{IdentityError, IdentityResult};

/// Hashes `password` with a fresh random salt.
pub fn hash_password(password: &str) -> IdentityResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| IdentityError::Hashing(err.to_string()))
}

/// Returns whether `password` matches the stored PHC `hash`.
///
/// # Errors
/// - `Hashing` when `hash` is not a parseable PHC string.
pub fn verify_password(password: &str, hash: &str) -> IdentityResult<bool> {
    let parsed = PasswordHash::new(hash)
        .map_err(|err| IdentityError::Hashing(format!("invalid stored hash: {err}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}
