//! Session token issuance, validation and revocation.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use gamerent_core::config::auth::AuthConfig;
use gamerent_core::error::{AppError, AuthError};

use crate::jwt::{JwtDecoder, JwtEncoder};
use crate::revocation::RevocationSet;

/// A freshly issued token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// The signed token string.
    pub token: String,
    /// When the token stops validating.
    pub expires_at: DateTime<Utc>,
}

/// Issues signed, time-bounded bearer tokens and tracks revocations.
///
/// A token is valid iff its signature verifies, it has not expired, and it
/// has not been revoked. The secret is fixed when the manager is built.
#[derive(Debug)]
pub struct SessionTokenManager {
    encoder: JwtEncoder,
    decoder: JwtDecoder,
    revoked: RevocationSet,
}

impl SessionTokenManager {
    /// Build a manager from configuration. Fails without a secret.
    pub fn new(config: &AuthConfig) -> Result<Self, AppError> {
        let secret = config
            .secret()
            .ok_or_else(|| AppError::configuration("auth.token_secret is not set"))?;
        Ok(Self {
            encoder: JwtEncoder::new(secret, config.token_ttl_minutes),
            decoder: JwtDecoder::new(secret),
            revoked: RevocationSet::new(),
        })
    }

    /// Issue a token for `identity`.
    pub fn issue(&self, identity: &str) -> Result<IssuedToken, AppError> {
        let (token, expires_at) = self.encoder.issue(identity)?;
        debug!(identity, %expires_at, "Issued session token");
        Ok(IssuedToken { token, expires_at })
    }

    /// Resolve `token` to its identity.
    pub fn validate(&self, token: &str) -> Result<String, AuthError> {
        let claims = self.decoder.decode(token)?;
        if self.revoked.contains(token) {
            return Err(AuthError::Revoked);
        }
        Ok(claims.sub)
    }

    /// Revoke `token`. The signature must verify; expiry is not required.
    ///
    /// Returns the identity the token belonged to.
    pub fn revoke(&self, token: &str) -> Result<String, AuthError> {
        let claims = self.decoder.decode_signature_only(token)?;
        let pruned = self.revoked.prune_expired(Utc::now());
        self.revoked.revoke(token, claims.expires_at());
        info!(identity = %claims.sub, pruned, "Session token revoked");
        Ok(claims.sub)
    }

    /// The revocation set, for inspection.
    pub fn revocations(&self) -> &RevocationSet {
        &self.revoked
    }

    /// The underlying encoder.
    pub fn encoder(&self) -> &JwtEncoder {
        &self.encoder
    }
}
