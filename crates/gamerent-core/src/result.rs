//! Convenience result type aliases for GameRent.

use crate::error::{AppError, StoreError};

/// A specialized `Result` type for GameRent operations.
pub type AppResult<T> = Result<T, AppError>;

/// Result of a [`DocumentStore`](crate::traits::DocumentStore) operation.
pub type StoreResult<T> = Result<T, StoreError>;
