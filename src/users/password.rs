//! Argon2id password hashing.
//!
//! Hashing is CPU-bound for tens of milliseconds, so both entry points hand
//! the work to Tokio's blocking pool instead of stalling a runtime worker.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tokio::task;
use tracing::error;

use crate::error::ModelError;

fn hash_error(context: &'static str, e: impl std::fmt::Display) -> ModelError {
    error!(error = %e, context, "password hashing failed");
    ModelError::PasswordHash(e.to_string())
}

fn hash_blocking(plain: &[u8]) -> Result<String, ModelError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain, &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| hash_error("hash", e))
}

fn verify_blocking(plain: &[u8], stored: &str) -> Result<bool, ModelError> {
    let parsed = PasswordHash::new(stored).map_err(|e| hash_error("parse stored hash", e))?;
    Ok(Argon2::default().verify_password(plain, &parsed).is_ok())
}

/// PHC string with a fresh random salt.
pub async fn hash_password(plain: &str) -> Result<String, ModelError> {
    let plain = plain.as_bytes().to_vec();
    task::spawn_blocking(move || hash_blocking(&plain))
        .await
        .map_err(|e| hash_error("join hashing task", e))?
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub async fn verify_password(plain: &str, stored: &str) -> Result<bool, ModelError> {
    let (plain, stored) = (plain.as_bytes().to_vec(), stored.to_owned());
    task::spawn_blocking(move || verify_blocking(&plain, &stored))
        .await
        .map_err(|e| hash_error("join verify task", e))?
}
