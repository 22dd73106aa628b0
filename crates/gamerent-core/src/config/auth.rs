//! Authentication configuration.

use serde::{Deserialize, Serialize};

/// Token signing and password hashing configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthConfig {
    /// Secret key for token signing (HMAC-SHA256). Required.
    #[serde(default)]
    pub token_secret: Option<String>,
    /// Token TTL in minutes.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_minutes: u64,
    /// Password hashing cost parameters.
    #[serde(default)]
    pub hashing: PasswordHashConfig,
}

impl AuthConfig {
    /// Config with the given secret and default everything else.
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            token_secret: Some(secret.into()),
            token_ttl_minutes: default_token_ttl(),
            hashing: PasswordHashConfig::default(),
        }
    }

    /// The configured secret, if present and non-empty.
    pub fn secret(&self) -> Option<&str> {
        self.token_secret.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// Argon2id cost parameters.
///
/// These are server configuration only; nothing in a request can change them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordHashConfig {
    /// Number of passes over memory.
    #[serde(default = "default_time_cost")]
    pub time_cost: u32,
    /// Memory size in KiB.
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    /// Degree of parallelism.
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
    /// Derived hash length in bytes.
    #[serde(default = "default_output_len")]
    pub output_len: usize,
    /// Generated salt length in bytes.
    #[serde(default = "default_salt_len")]
    pub salt_len: usize,
}

impl Default for PasswordHashConfig {
    fn default() -> Self {
        Self {
            time_cost: default_time_cost(),
            memory_kib: default_memory_kib(),
            parallelism: default_parallelism(),
            output_len: default_output_len(),
            salt_len: default_salt_len(),
        }
    }
}

fn default_token_ttl() -> u64 {
    60
}

fn default_time_cost() -> u32 {
    5
}

fn default_memory_kib() -> u32 {
    7 * 1024
}

fn default_parallelism() -> u32 {
    4
}

fn default_output_len() -> usize {
    32
}

fn default_salt_len() -> usize {
    16
}
