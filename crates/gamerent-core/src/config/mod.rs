//! Application configuration schemas.
//!
//! All configuration structs are deserialized via the `config` crate from
//! `config/default.toml`, an environment overlay, and `GAMERENT__*`
//! environment variables. Every section has serde defaults, so an empty
//! source set still produces a config; [`AppConfig::validate`] decides
//! whether it is usable.

pub mod app;
pub mod auth;
pub mod database;
pub mod logging;
pub mod realtime;

use serde::{Deserialize, Serialize};

use self::app::ServerConfig;
use self::auth::AuthConfig;
use self::database::{DatabaseConfig, StoreBackend};
use self::logging::LoggingConfig;
use self::realtime::RealtimeConfig;

use crate::error::AppError;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Document store settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Token and password hashing settings.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Real-time WebSocket settings.
    #[serde(default)]
    pub realtime: RealtimeConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `GAMERENT__`.
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("GAMERENT")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }

    /// Reject configurations the server cannot start with.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.auth.secret().is_none() {
            return Err(AppError::configuration(
                "auth.token_secret must be set (GAMERENT__AUTH__TOKEN_SECRET)",
            ));
        }
        if self.auth.token_ttl_minutes == 0 {
            return Err(AppError::configuration(
                "auth.token_ttl_minutes must be positive",
            ));
        }

        let hashing = &self.auth.hashing;
        if hashing.time_cost == 0 || hashing.parallelism == 0 {
            return Err(AppError::configuration(
                "auth.hashing time_cost and parallelism must be positive",
            ));
        }
        if hashing.memory_kib < 8 * hashing.parallelism {
            return Err(AppError::configuration(
                "auth.hashing.memory_kib must be at least 8 * parallelism",
            ));
        }
        if !(4..=64).contains(&hashing.output_len) {
            return Err(AppError::configuration(
                "auth.hashing.output_len must be between 4 and 64",
            ));
        }
        if !(8..=64).contains(&hashing.salt_len) {
            return Err(AppError::configuration(
                "auth.hashing.salt_len must be between 8 and 64",
            ));
        }

        if self.realtime.channel_buffer_size == 0 {
            return Err(AppError::configuration(
                "realtime.channel_buffer_size must be positive",
            ));
        }
        if self.realtime.notifications.enabled && self.realtime.notifications.interval_seconds == 0
        {
            return Err(AppError::configuration(
                "realtime.notifications.interval_seconds must be positive",
            ));
        }

        if self.database.backend == StoreBackend::Postgres && self.database.url.is_none() {
            return Err(AppError::configuration(
                "database.url is required for the postgres backend",
            ));
        }

        Ok(())
    }
}
