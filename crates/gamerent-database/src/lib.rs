//! # gamerent-database
//!
//! [`DocumentStore`](gamerent_core::DocumentStore) backends (in-memory and
//! PostgreSQL/JSONB), connection management, and the credential and catalog
//! repositories built on top of the store.

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod store;

pub use connection::DatabasePool;
pub use store::{MemoryDocumentStore, PgDocumentStore, open_store};
