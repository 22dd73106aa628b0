//! Argon2id password hashing and verification.
//!
//! Hash and salt are kept separately as standard base64 strings, which is
//! how credentials are stored. Cost parameters come from
//! [`PasswordHashConfig`] and are fixed for the lifetime of the hasher.

use argon2::password_hash::Output;
use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use gamerent_core::config::auth::PasswordHashConfig;
use gamerent_core::error::AppError;

/// A derived hash together with the salt it was derived with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashedPassword {
    /// Base64 encoded hash.
    pub hash: String,
    /// Base64 encoded salt.
    pub salt: String,
}

/// Handles password hashing and verification using Argon2id.
#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
    salt_len: usize,
}

impl PasswordHasher {
    /// Creates a hasher with the configured cost parameters.
    pub fn new(config: &PasswordHashConfig) -> Result<Self, AppError> {
        let params = Params::new(
            config.memory_kib,
            config.time_cost,
            config.parallelism,
            Some(config.output_len),
        )
        .map_err(|e| AppError::configuration(format!("Invalid password hash parameters: {e}")))?;

        Ok(Self {
            params,
            salt_len: config.salt_len,
        })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    fn derive(&self, password: &str, salt: &[u8]) -> Result<Vec<u8>, AppError> {
        let mut output = vec![0u8; self.params.output_len().unwrap_or(Params::DEFAULT_OUTPUT_LEN)];
        self.argon2()
            .hash_password_into(password.as_bytes(), salt, &mut output)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;
        Ok(output)
    }

    /// Generates a fresh random salt from the OS RNG.
    pub fn generate_salt(&self) -> Result<Vec<u8>, AppError> {
        let mut salt = vec![0u8; self.salt_len];
        OsRng
            .try_fill_bytes(&mut salt)
            .map_err(|e| AppError::internal(format!("Salt generation failed: {e}")))?;
        Ok(salt)
    }

    /// Hashes a password with a fresh random salt.
    pub fn hash(&self, password: &str) -> Result<HashedPassword, AppError> {
        let salt = self.generate_salt()?;
        self.hash_with_salt(password, &salt)
    }

    /// Hashes a password with a caller-supplied salt.
    pub fn hash_with_salt(&self, password: &str, salt: &[u8]) -> Result<HashedPassword, AppError> {
        let hash = self.derive(password, salt)?;
        Ok(HashedPassword {
            hash: STANDARD.encode(hash),
            salt: STANDARD.encode(salt),
        })
    }

    /// Re-derives the hash of `password` with the stored salt and compares it
    /// to `expected_hash` in constant time.
    ///
    /// Undecodable stored values, or a stored hash of an impossible length,
    /// are an error, not a mismatch.
    pub fn compare(&self, password: &str, salt: &str, expected_hash: &str) -> Result<bool, AppError> {
        let salt = STANDARD
            .decode(salt)
            .map_err(|e| AppError::internal(format!("Invalid stored salt: {e}")))?;
        let expected = STANDARD
            .decode(expected_hash)
            .map_err(|e| AppError::internal(format!("Invalid stored hash: {e}")))?;

        let expected = Output::new(&expected)
            .map_err(|e| AppError::internal(format!("Invalid stored hash: {e}")))?;

        let actual = self.derive(password, &salt)?;
        let actual = Output::new(&actual)
            .map_err(|e| AppError::internal(format!("Password hashing failed: {e}")))?;
        // `Output` equality is constant-time.
        Ok(actual == expected)
    }
}
