use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use tokio::task;
use tracing::warn;

use crate::shared::AppError;

/// Hashes a password into a PHC string with a random salt
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| {
        warn!(error = %e, "Failed to gather salt entropy");
        AppError::Internal
    })?;
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| {
        warn!(error = %e, "Failed to encode salt");
        AppError::Internal
    })?;

    let phc = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| {
            warn!(error = %e, "Failed to hash password");
            AppError::Internal
        })?
        .to_string();
    Ok(phc)
}

/// False for a wrong password and for a hash that can't be parsed
pub fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// `hash_password` on the blocking pool
pub async fn hash_password_blocking(password: String) -> Result<String, AppError> {
    task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| {
            warn!(error = %e, "Password hashing task failed");
            AppError::Internal
        })?
}

/// `verify_password` on the blocking pool
pub async fn verify_password_blocking(hash: String, password: String) -> Result<bool, AppError> {
    task::spawn_blocking(move || verify_password(&hash, &password))
        .await
        .map_err(|e| {
            warn!(error = %e, "Password verification task failed");
            AppError::Internal
        })
}
