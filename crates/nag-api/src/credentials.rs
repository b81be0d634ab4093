use std::ops::RangeInclusive;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand_core::OsRng;

use nag_db::Database;
use nag_db::models::UserRow;

use crate::error::ApiError;

pub const USERNAME_LEN: RangeInclusive<usize> = 3..=50;
pub const MIN_PASSWORD_LEN: usize = 6;

pub fn validate_registration(username: &str, password: &str) -> Result<(), ApiError> {
    if !USERNAME_LEN.contains(&username.chars().count()) {
        return Err(ApiError::Validation(format!(
            "username must be between {} and {} characters",
            USERNAME_LEN.start(),
            USERNAME_LEN.end()
        )));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation(format!(
            "password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }
    Ok(())
}

/// Argon2id with a fresh random salt per call.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(stored_hash: &str, password: &str) -> Result<(), ApiError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| anyhow::anyhow!("stored password hash is unreadable: {}", e))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| ApiError::InvalidCredentials)
}

/// Creates a user. Blocking: call from `spawn_blocking`.
pub fn register(db: &Database, username: &str, password: &str) -> Result<UserRow, ApiError> {
    validate_registration(username, password)?;

    if db.get_user_by_username(username)?.is_some() {
        return Err(ApiError::DuplicateUsername);
    }

    let password_hash = hash_password(password)?;

    // A concurrent registration can still win between the check above and
    // this insert; the UNIQUE constraint turns that into DuplicateUsername.
    Ok(db.create_user(username, &password_hash)?)
}

/// Checks a username/password pair. Blocking: call from `spawn_blocking`.
pub fn verify(db: &Database, username: &str, password: &str) -> Result<UserRow, ApiError> {
    let user = db
        .get_user_by_username(username)?
        .ok_or(ApiError::InvalidCredentials)?;

    verify_password(&user.password, password)?;
    Ok(user)
}
