//! # gamerent-api
//!
//! HTTP API layer for GameRent built on Axum.
//!
//! Provides the account and catalog REST endpoints, the WebSocket upgrade
//! into the real-time gateway, the bearer-token extractor, DTOs, and the
//! mapping from [`AppError`](gamerent_core::AppError) to HTTP responses.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

pub use app::{build_app, build_state, build_state_with_store, run_server};
pub use state::AppState;
