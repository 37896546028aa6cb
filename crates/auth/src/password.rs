//! Password hashing (bcrypt).
//!
//! These calls are CPU-bound; async callers run them on the blocking pool.

use thiserror::Error;

pub use bcrypt::DEFAULT_COST;

/// bcrypt only reads the first 72 bytes of input.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PasswordError {
    #[error("password must not be empty")]
    Empty,

    #[error("password exceeds 72 bytes")]
    TooLong,

    #[error("password hashing failed: {0}")]
    Hashing(String),
}

pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::Empty);
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(PasswordError::TooLong);
    }
    Ok(())
}

pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    validate_password(password)?;
    bcrypt::hash(password, cost).map_err(|e| PasswordError::Hashing(e.to_string()))
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
    bcrypt::verify(password, hash).map_err(|e| PasswordError::Hashing(e.to_string()))
}
