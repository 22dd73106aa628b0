//! Auth handlers: register, login, logout.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::{info, warn};

use gamerent_auth::HashedPassword;
use gamerent_core::error::{AppError, ErrorKind};
use gamerent_core::traits::StoreOp;

use crate::dto::request::{LoginRequest, RegisterRequest, validated};
use crate::dto::response::{AuthResponse, LogoutResponse};
use crate::error::success_status;
use crate::extractors::AuthUser;
use crate::state::AppState;

const INVALID_CREDENTIALS: &str = "Invalid username or password";

/// Runs a CPU-bound hasher call off the async runtime.
async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::internal(format!("Hashing task failed: {e}")))?
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), AppError> {
    let req = validated(req)?;

    let hasher = state.password_hasher.clone();
    let password = req.password;
    let HashedPassword { hash, salt } = blocking(move || hasher.hash(&password)).await?;

    let user_id = state
        .credentials
        .create(&req.username, &hash, &salt)
        .await
        .map_err(|e| {
            let err = AppError::from(e);
            if err.kind == ErrorKind::Conflict {
                AppError::conflict(format!("Username '{}' is already taken", req.username))
            } else {
                err
            }
        })?;

    let issued = state.tokens.issue(&req.username)?;
    info!(identity = %req.username, user_id = %user_id, "Account registered");

    Ok((
        success_status(StoreOp::Insert),
        Json(AuthResponse {
            user_id: user_id.to_string(),
            token: issued.token,
            expires_at: issued.expires_at,
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let req = validated(req)?;
    let credential = state.credentials.find_by_username(&req.username).await?;

    let hasher = state.password_hasher.clone();
    let password = req.password;
    let Some(credential) = credential else {
        // Unknown usernames still pay for one hash.
        blocking(move || hasher.hash(&password)).await?;
        warn!(identity = %req.username, "Login for unknown username");
        return Err(AppError::authentication(INVALID_CREDENTIALS));
    };

    let (salt, expected) = (credential.salt.clone(), credential.password_hash.clone());
    let matches = blocking(move || hasher.compare(&password, &salt, &expected)).await?;
    if !matches {
        warn!(identity = %req.username, "Login with wrong password");
        return Err(AppError::authentication(INVALID_CREDENTIALS));
    }

    let issued = state.tokens.issue(&credential.username)?;
    info!(identity = %credential.username, "Logged in");

    Ok(Json(AuthResponse {
        user_id: credential.id.to_string(),
        token: issued.token,
        expires_at: issued.expires_at,
    }))
}

/// POST /api/auth/logout
///
/// Revokes the presented token and closes every real-time connection of
/// the caller.
pub async fn logout(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<LogoutResponse>, AppError> {
    state.tokens.revoke(&auth.token)?;
    let connections_closed = state
        .realtime
        .registry
        .retire_by_identity(&auth.identity)
        .await;

    info!(identity = %auth.identity, connections_closed, "Logged out");

    Ok(Json(LogoutResponse {
        message: "Logged out successfully".to_string(),
        connections_closed,
    }))
}
