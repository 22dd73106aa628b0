//! Generic document persistence.

use async_trait::async_trait;

use crate::result::StoreResult;
use crate::types::{Document, DocumentBody, DocumentId, Filter, Pagination};

/// CRUD over named collections with conflict-aware insert and conditional
/// edit/delete.
///
/// Implementations must keep identifiers immutable, bump `version` by
/// exactly one on every successful replace, and ignore reserved keys in
/// caller bodies.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    /// Documents matching `filter`, in insertion order, windowed by
    /// `pagination`.
    async fn query(
        &self,
        collection: &str,
        filter: &Filter,
        pagination: Option<Pagination>,
    ) -> StoreResult<Vec<Document>>;

    /// Insert `body` as a new document.
    ///
    /// When `unique` is given and matches an existing document the insert
    /// fails with `Conflict` and nothing is written.
    async fn insert(
        &self,
        collection: &str,
        unique: Option<&Filter>,
        body: DocumentBody,
    ) -> StoreResult<DocumentId>;

    /// Delete the first document matching `filter`, or `NotFound`.
    async fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<()>;

    /// Replace the body of the first document matching `filter`.
    ///
    /// Both "no match" and "body unchanged" are `NotFound`.
    async fn replace_one(
        &self,
        collection: &str,
        filter: &Filter,
        body: DocumentBody,
    ) -> StoreResult<Document>;

    /// The first document matching `filter`, if any.
    async fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        let mut docs = self
            .query(collection, filter, Some(Pagination::new(0, Some(1))))
            .await?;
        Ok(docs.pop())
    }

    /// Short backend name for logs and health output.
    fn backend_name(&self) -> &'static str;
}

/// Store operation, for status classification of successful calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    /// `query` / `find_one`.
    Query,
    /// `insert`.
    Insert,
    /// `delete_one`.
    Delete,
    /// `replace_one`.
    Replace,
}

impl StoreOp {
    /// Status of a successful call: 201 for insert, 200 otherwise.
    pub fn success_status(&self) -> u16 {
        match self {
            Self::Insert => 201,
            Self::Query | Self::Delete | Self::Replace => 200,
        }
    }
}
