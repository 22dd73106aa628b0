//! Process-local document store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use gamerent_core::error::StoreError;
use gamerent_core::result::StoreResult;
use gamerent_core::traits::DocumentStore;
use gamerent_core::types::{Document, DocumentBody, DocumentId, Filter, Pagination};

use super::matcher::matches;

/// In-memory [`DocumentStore`]. Collections keep insertion order.
///
/// Every operation runs under one lock acquisition, so unlike the
/// PostgreSQL backend the uniqueness check and the insert are atomic here.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryDocumentStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents in `collection`.
    pub async fn len(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn query(
        &self,
        collection: &str,
        filter: &Filter,
        pagination: Option<Pagination>,
    ) -> StoreResult<Vec<Document>> {
        let collections = self.collections.read().await;
        let Some(docs) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        let matching = docs.iter().filter(|doc| matches(filter, doc));
        Ok(pagination
            .unwrap_or_default()
            .apply(matching)
            .cloned()
            .collect())
    }

    async fn insert(
        &self,
        collection: &str,
        unique: Option<&Filter>,
        body: DocumentBody,
    ) -> StoreResult<DocumentId> {
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        if let Some(unique) = unique {
            if docs.iter().any(|doc| matches(unique, doc)) {
                debug!(collection, "Insert rejected by uniqueness filter");
                return Err(StoreError::conflict(collection));
            }
        }

        let doc = Document::new(body);
        let id = doc.id;
        docs.push(doc);
        debug!(collection, %id, "Document inserted");
        Ok(id)
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<()> {
        let mut collections = self.collections.write().await;
        let docs = collections
            .get_mut(collection)
            .ok_or_else(|| StoreError::not_found(collection))?;
        let pos = docs
            .iter()
            .position(|doc| matches(filter, doc))
            .ok_or_else(|| StoreError::not_found(collection))?;
        let removed = docs.remove(pos);
        debug!(collection, id = %removed.id, "Document deleted");
        Ok(())
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: &Filter,
        body: DocumentBody,
    ) -> StoreResult<Document> {
        let mut collections = self.collections.write().await;
        let doc = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|doc| matches(filter, doc)))
            .ok_or_else(|| StoreError::not_found(collection))?;

        if !doc.replace_body(body) {
            debug!(collection, id = %doc.id, "Replace left document unchanged");
            return Err(StoreError::not_found(collection));
        }
        debug!(collection, id = %doc.id, version = doc.version, "Document replaced");
        Ok(doc.clone())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
