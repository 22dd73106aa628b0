//! Application state shared across all handlers.

use std::sync::Arc;

use gamerent_auth::{PasswordHasher, SessionTokenManager};
use gamerent_core::config::AppConfig;
use gamerent_core::traits::DocumentStore;
use gamerent_database::repositories::{CredentialRepository, ItemRepository};
use gamerent_realtime::RealtimeEngine;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. Every field is cheap
/// to clone.
#[derive(Clone)]
pub struct AppState {
    // ── Configuration ────────────────────────────────────────
    /// Application configuration
    pub config: Arc<AppConfig>,

    // ── Infrastructure ───────────────────────────────────────
    /// Document store backing every repository
    pub store: Arc<dyn DocumentStore>,

    // ── Auth ─────────────────────────────────────────────────
    /// Password hasher (Argon2id)
    pub password_hasher: Arc<PasswordHasher>,
    /// Token issue, validation and revocation
    pub tokens: Arc<SessionTokenManager>,

    // ── Realtime ─────────────────────────────────────────────
    /// WebSocket realtime engine
    pub realtime: Arc<RealtimeEngine>,

    // ── Repositories ─────────────────────────────────────────
    /// Account credentials
    pub credentials: CredentialRepository,
    /// Catalog items
    pub items: ItemRepository,
}
