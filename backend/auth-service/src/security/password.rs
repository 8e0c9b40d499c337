/// Password hashing and verification using Argon2id
use crate::config::HasherSettings;
use crate::error::{AuthError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

/// Argon2id hasher with cost parameters taken from configuration.
///
/// The work factor is deliberately tunable: raising the deployed cost only
/// affects newly stored hashes, since verification reads the parameters
/// embedded in each PHC string.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
}

impl PasswordHasher {
    pub fn new(settings: &HasherSettings) -> Result<Self> {
        let params = Params::new(
            settings.memory_kib,
            settings.iterations,
            settings.parallelism,
            None,
        )
        .map_err(|e| AuthError::Internal(format!("invalid Argon2 parameters: {e}")))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    /// Hash a plaintext password.
    ///
    /// A random 16-byte salt is generated per password; the output is a
    /// PHC-formatted string safe for database storage.
    pub fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);

        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Internal(format!("password hashing failed: {e}")))?
            .to_string();

        Ok(password_hash)
    }

    /// Verify a candidate password against a stored hash.
    ///
    /// Constant-time comparison. Malformed hash input verifies as `false`
    /// rather than erroring, so callers treat every non-match identically.
    pub fn verify(&self, stored_hash: &str, candidate: &str) -> bool {
        match PasswordHash::new(stored_hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(candidate.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}
