//! Password hashing with Argon2id.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::config::AuthConfig;
use crate::error::AppError;

/// Salted one-way hashing with configurable cost.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
    /// Hash of a random password under the same params, verified against
    /// when there is no stored hash so that path costs the same.
    decoy_hash: String,
}

impl PasswordHasher {
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, AppError> {
        let params = Params::new(memory_kib, iterations, parallelism, None)
            .map_err(|e| AppError::ConfigError(format!("Invalid hashing parameters: {}", e)))?;

        let mut hasher = Self {
            params,
            decoy_hash: String::new(),
        };
        let decoy_password = SaltString::generate(&mut OsRng);
        hasher.decoy_hash = hasher.hash(decoy_password.as_str())?;
        Ok(hasher)
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, AppError> {
        Self::new(
            config.hash_memory_kib,
            config.hash_iterations,
            config.hash_parallelism,
        )
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::HashingError(e.to_string()))
    }

    /// `false` for a wrong password and for an unparseable stored hash.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };

        self.argon2()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }

    /// Runs a full verification that always fails. Used when the account
    /// does not exist.
    pub fn verify_decoy(&self, password: &str) -> bool {
        self.verify(password, &self.decoy_hash)
    }
}
