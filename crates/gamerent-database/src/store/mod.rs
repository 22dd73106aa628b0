//! [`DocumentStore`] backends.

pub mod matcher;
pub mod memory;
pub mod postgres;

#[cfg(test)]
mod conformance;

use std::sync::Arc;

use tracing::info;

use gamerent_core::config::database::{DatabaseConfig, StoreBackend};
use gamerent_core::result::AppResult;
use gamerent_core::traits::DocumentStore;

use crate::connection::DatabasePool;
use crate::migration::run_migrations;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

/// Open the backend selected by `config.backend`.
///
/// The PostgreSQL backend connects and runs pending migrations first.
pub async fn open_store(config: &DatabaseConfig) -> AppResult<Arc<dyn DocumentStore>> {
    let store: Arc<dyn DocumentStore> = match config.backend {
        StoreBackend::Memory => Arc::new(MemoryDocumentStore::new()),
        StoreBackend::Postgres => {
            let pool = DatabasePool::connect(config).await?;
            run_migrations(pool.pool()).await?;
            Arc::new(PgDocumentStore::new(pool.into_pool()))
        }
    };
    info!(backend = store.backend_name(), "Document store ready");
    Ok(store)
}
