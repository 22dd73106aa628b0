//! # gamerent-core
//!
//! Core crate for GameRent. Contains configuration schemas, the document
//! model shared by every store backend, the [`DocumentStore`] trait, and the
//! unified error system.
//!
//! This crate has **no** internal dependencies on other GameRent crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::{AppError, AuthError, ErrorKind, ProtocolError, StoreError, TransportError};
pub use result::{AppResult, StoreResult};
pub use traits::{DocumentStore, StoreOp};
pub use types::{Document, DocumentBody, DocumentId, Filter, FilterField, FilterOp, Pagination};
