use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::Rng;
use tracing::warn;

use crate::shared::AppError;

fn salt() -> Result<SaltString, AppError> {
    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    SaltString::encode_b64(&bytes).map_err(|e| AppError::PasswordHash(e.to_string()))
}

/// Hashes a password with Argon2 and a fresh random salt
pub fn hash(password: &str) -> Result<String, AppError> {
    Argon2::default()
        .hash_password(password.as_bytes(), &salt()?)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::PasswordHash(e.to_string()))
}

/// True iff `password` produced `hashword`; a malformed hash is just a mismatch
pub fn verify(hashword: &str, password: &str) -> bool {
    PasswordHash::new(hashword)
        .map(|hash| {
            Argon2::default()
                .verify_password(password.as_bytes(), &hash)
                .is_ok()
        })
        .unwrap_or(false)
}

/// `hash` on the blocking pool, keeping request workers free
pub async fn hash_off_thread(password: String) -> Result<String, AppError> {
    tokio::task::spawn_blocking(move || hash(&password))
        .await
        .map_err(|e| {
            warn!(error = %e, "Password hashing task failed");
            AppError::Internal
        })?
}

/// `verify` on the blocking pool
pub async fn verify_off_thread(hashword: String, password: String) -> Result<bool, AppError> {
    tokio::task::spawn_blocking(move || verify(&hashword, &password))
        .await
        .map_err(|e| {
            warn!(error = %e, "Password verification task failed");
            AppError::Internal
        })
}
