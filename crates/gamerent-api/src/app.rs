//! Application builder: wires state, router and middleware into an Axum
//! app and runs it.

use std::future::IntoFuture;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::sync::oneshot;
use tower_http::trace::TraceLayer;

use gamerent_auth::{PasswordHasher, SessionTokenManager};
use gamerent_core::config::AppConfig;
use gamerent_core::error::AppError;
use gamerent_core::traits::DocumentStore;
use gamerent_database::open_store;
use gamerent_database::repositories::{CredentialRepository, ItemRepository};
use gamerent_realtime::RealtimeEngine;

use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    build_router(state).layer(TraceLayer::new_for_http())
}

/// Builds application state over the configured store backend.
pub async fn build_state(config: AppConfig) -> Result<AppState, AppError> {
    let store = open_store(&config.database).await?;
    build_state_with_store(config, store)
}

/// Builds application state over an already opened store.
pub fn build_state_with_store(
    config: AppConfig,
    store: Arc<dyn DocumentStore>,
) -> Result<AppState, AppError> {
    let password_hasher = Arc::new(PasswordHasher::new(&config.auth.hashing)?);
    let tokens = Arc::new(SessionTokenManager::new(&config.auth)?);
    let realtime = Arc::new(RealtimeEngine::new(&config.realtime, Arc::clone(&tokens)));

    Ok(AppState {
        config: Arc::new(config),
        credentials: CredentialRepository::new(Arc::clone(&store)),
        items: ItemRepository::new(Arc::clone(&store)),
        store,
        password_hasher,
        tokens,
        realtime,
    })
}

/// Runs the GameRent server until a shutdown signal arrives.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting GameRent server...");

    let addr = config.server.bind_address();
    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let state = build_state(config).await?;
    tracing::info!(store = state.store.backend_name(), "Document store ready");

    let realtime = Arc::clone(&state.realtime);
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;

    tracing::info!("GameRent server listening on {}", addr);

    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    // Upgraded sockets are not tracked by graceful shutdown.
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            realtime.shutdown().await;
            let _ = signalled_tx.send(());
        })
        .into_future();

    let grace_elapsed = async move {
        if signalled_rx.await.is_ok() {
            tokio::time::sleep(grace).await;
        } else {
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        result = server => {
            result.map_err(|e| AppError::internal(format!("Server error: {e}")))?;
        }
        _ = grace_elapsed => {
            tracing::warn!(grace_seconds = grace.as_secs(), "Shutdown grace elapsed, dropping open requests");
        }
    }

    tracing::info!("GameRent server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C"),
        _ = terminate => tracing::info!("Received SIGTERM"),
    }
}
