use argon2::password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier as _, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use ring::rand::{SecureRandom, SystemRandom};

use super::login_service::PasswordVerifier;
use crate::errors::{Error, Result};

const SALT_LEN: usize = 16;

pub fn password_hasher() -> Result<Argon2<'static>> {
    // Argon2id tuned so a login stays within the interactive latency budget.
    const MEMORY_COST_KIB: u32 = 19 * 1024;
    const ITERATIONS: u32 = 2;
    const PARALLELISM: u32 = 1;
    let params = Params::new(MEMORY_COST_KIB, ITERATIONS, PARALLELISM, Some(32))
        .map_err(|err| Error::internal(format!("Invalid Argon2 parameters: {}", err)))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

pub fn hash_password(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; SALT_LEN];
    SystemRandom::new()
        .fill(&mut salt_bytes)
        .map_err(|_| Error::internal("Failed to generate password salt"))?;
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|err| Error::internal(format!("Failed to encode password salt: {}", err)))?;

    let hash = password_hasher()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| Error::internal(format!("Failed to hash password: {}", err)))?;
    Ok(hash.to_string())
}

/// `Ok(false)` on mismatch; `Err` when `stored_hash` is not a valid PHC string.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|err| Error::internal(format!("Stored password hash is malformed: {}", err)))?;

    match password_hasher()?.verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(err) => Err(Error::internal(format!("Password verification failed: {}", err))),
    }
}

/// Production [`PasswordVerifier`] backed by Argon2.
#[derive(Debug, Default, Clone, Copy)]
pub struct Argon2PasswordVerifier;

impl PasswordVerifier for Argon2PasswordVerifier {
    fn verify(&self, password: &str, stored_hash: &str) -> Result<bool> {
        verify_password(password, stored_hash)
    }
}
