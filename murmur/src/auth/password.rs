use argon2::{
    Argon2,
    password_hash::{self, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::errors::{ServiceError, ServiceResult};

/// Argon2id password hashing, run on tokio's blocking pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    pub fn new() -> Self {
        Self
    }

    /// Hash `password` into a PHC string.
    pub async fn hash(&self, password: &str) -> ServiceResult<String> {
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || hash_blocking(&password))
            .await
            .map_err(|err| ServiceError::Credential(format!("hashing task failed: {err}")))?
    }

    /// `Ok(false)` on mismatch; `Err` only when `hash` is not a valid PHC string.
    pub async fn verify(&self, password: &str, hash: &str) -> ServiceResult<bool> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        tokio::task::spawn_blocking(move || verify_blocking(&password, &hash))
            .await
            .map_err(|err| ServiceError::Credential(format!("verification task failed: {err}")))?
    }
}

fn hash_blocking(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ServiceError::Credential(format!("password hashing failed: {err}")))
}

fn verify_blocking(password: &str, hash: &str) -> ServiceResult<bool> {
    let parsed =
        PasswordHash::new(hash).map_err(|err| ServiceError::Credential(format!("stored hash is invalid: {err}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(err) => Err(ServiceError::Credential(format!("password verification failed: {err}"))),
    }
}
