//! Core type definitions used across the GameRent workspace.

pub mod document;
pub mod filter;
pub mod pagination;

pub use document::{Document, DocumentBody, DocumentId, RESERVED_KEYS};
pub use filter::{Filter, FilterField, FilterOp};
pub use pagination::Pagination;
