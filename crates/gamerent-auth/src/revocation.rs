//! Tokens revoked by explicit logout.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// When a token was revoked and when it would have expired anyway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RevokedEntry {
    /// Time of the logout.
    pub revoked_at: DateTime<Utc>,
    /// Expiry embedded in the token.
    pub expires_at: DateTime<Utc>,
}

/// Raw token string to revocation record.
///
/// An entry is only needed until the token's own expiry; after that the
/// signature check rejects the token regardless, so expired entries can be
/// pruned.
#[derive(Debug, Default)]
pub struct RevocationSet {
    entries: DashMap<String, RevokedEntry>,
}

impl RevocationSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `token` as revoked.
    pub fn revoke(&self, token: &str, expires_at: DateTime<Utc>) {
        self.entries.insert(
            token.to_string(),
            RevokedEntry {
                revoked_at: Utc::now(),
                expires_at,
            },
        );
    }

    /// Whether `token` was revoked.
    pub fn contains(&self, token: &str) -> bool {
        self.entries.contains_key(token)
    }

    /// Revocation record for `token`, if any.
    pub fn get(&self, token: &str) -> Option<RevokedEntry> {
        self.entries.get(token).map(|entry| *entry)
    }

    /// Drop entries whose embedded expiry is at or before `now`.
    ///
    /// Returns the number of entries removed.
    pub fn prune_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        before - self.entries.len()
    }

    /// Number of tracked tokens.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no tokens are tracked.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
