//! Password and note-PIN hashing using Argon2id.
//!
//! Both user passwords and note PINs are stored as Argon2id PHC strings.
//! Verification is constant-time via the password-hash crate.

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier,
    SaltString};
use argon2::{Algorithm, Argon2, Params, Version};

use crate::error::{CryptoError, CryptoResult};

/// Argon2id parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashParams {
    /// Memory in KiB (default: 65536 = 64 MiB).
    pub memory_kib: u32,
    /// Time iterations (default: 3).
    pub iterations: u32,
    /// Parallelism degree (default: 4).
    pub parallelism: u32,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            memory_kib: 65536, // 64 MiB
            iterations: 3,
            parallelism: 4,
        }
    }
}

impl HashParams {
    /// Low-memory parameters for resource-constrained environments.
    ///
    /// Note PINs are hashed with these: PINs gate a single note behind an
    /// already-authenticated session, and lock/verify are interactive
    /// request-path operations.
    pub fn low_memory() -> Self {
        Self {
            memory_kib: 16384, // 16 MiB
            iterations: 2,
            parallelism: 2,
        }
    }
}

fn argon2(params: &HashParams) -> CryptoResult<Argon2<'static>> {
    let params = Params::new(params.memory_kib, params.iterations, params.parallelism, None)
        .map_err(|e| CryptoError::Hashing(e.to_string()))?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Hash a secret into an Argon2id PHC string with a fresh random salt.
pub fn hash_secret(secret: &str, params: &HashParams) -> CryptoResult<String> {
    if secret.is_empty() {
        return Err(CryptoError::InvalidInput("secret must not be empty".to_string()));
    }
    let salt = SaltString::generate(&mut OsRng);
    let hash = argon2(params)?
        .hash_password(secret.as_bytes(), &salt)
        .map_err(|e| CryptoError::Hashing(e.to_string()))?;
    Ok(hash.to_string())
}

/// Hash a user password with default parameters.
pub fn hash_password(password: &str) -> CryptoResult<String> {
    hash_secret(password, &HashParams::default())
}

/// Hash a note PIN with low-memory parameters.
pub fn hash_pin(pin: &str) -> CryptoResult<String> {
    hash_secret(pin, &HashParams::low_memory())
}

/// Verify a secret against a stored PHC string.
///
/// The parameters are read from the PHC string itself, so hashes created
/// with older parameter sets keep verifying.
pub fn verify_secret(secret: &str, phc: &str) -> CryptoResult<bool> {
    let parsed = PasswordHash::new(phc).map_err(|e| CryptoError::InvalidHash(e.to_string()))?;
    match Argon2::default().verify_password(secret.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(CryptoError::InvalidHash(e.to_string())),
    }
}
