//! JWT token creation with configurable signing and TTL.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use uuid::Uuid;

use gamerent_core::error::AppError;

use super::claims::Claims;

/// Creates signed HS256 session tokens.
#[derive(Clone)]
pub struct JwtEncoder {
    encoding_key: EncodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for JwtEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtEncoder").field("ttl", &self.ttl).finish()
    }
}

impl JwtEncoder {
    /// Creates a new encoder for `secret` issuing tokens valid for `ttl_minutes`.
    pub fn new(secret: &str, ttl_minutes: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            ttl: i64::try_from(ttl_minutes)
                .ok()
                .and_then(Duration::try_minutes)
                .unwrap_or(Duration::MAX),
        }
    }

    /// Builds claims for `identity` expiring one TTL from now.
    pub fn claims_for(&self, identity: &str) -> Claims {
        let now = Utc::now();
        Claims {
            sub: identity.to_string(),
            iat: now.timestamp(),
            exp: now
                .checked_add_signed(self.ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC)
                .timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Signs arbitrary claims.
    pub fn encode(&self, claims: &Claims) -> Result<String, AppError> {
        encode(&Header::default(), claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to encode token: {e}")))
    }

    /// Issues a token for `identity`, returning it with its expiry.
    pub fn issue(&self, identity: &str) -> Result<(String, DateTime<Utc>), AppError> {
        let claims = self.claims_for(identity);
        let token = self.encode(&claims)?;
        Ok((token, claims.expires_at()))
    }
}
