//! Catalog item repository over the `items` collection.
//!
//! Items are schemaless JSON objects with a required `title`. Every item is
//! owned by the identity that created it and is only visible to that owner.

use std::sync::Arc;

use serde_json::Value;

use gamerent_core::error::StoreError;
use gamerent_core::result::StoreResult;
use gamerent_core::traits::DocumentStore;
use gamerent_core::types::{Document, DocumentBody, Filter, Pagination};

/// Collection holding catalog items.
pub const ITEMS_COLLECTION: &str = "items";

/// Body field naming the owning identity.
pub const OWNER_FIELD: &str = "owner";

/// Repository for per-owner catalog items.
#[derive(Clone)]
pub struct ItemRepository {
    store: Arc<dyn DocumentStore>,
}

impl ItemRepository {
    /// Create a new item repository.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    fn owned(owner: &str) -> Filter {
        Filter::all().eq(OWNER_FIELD, owner)
    }

    fn owned_by_id(owner: &str, id: &str) -> Filter {
        Filter::by_id(id).eq(OWNER_FIELD, owner)
    }

    /// Items owned by `owner`, optionally narrowed by a case-insensitive
    /// title pattern.
    pub async fn list(
        &self,
        owner: &str,
        title: Option<&str>,
        pagination: Option<Pagination>,
    ) -> StoreResult<Vec<Document>> {
        let mut filter = Self::owned(owner);
        if let Some(title) = title {
            filter = filter.ilike("title", title);
        }
        self.store
            .query(ITEMS_COLLECTION, &filter, pagination)
            .await
    }

    /// One item by id, if it exists and belongs to `owner`.
    pub async fn get(&self, owner: &str, id: &str) -> StoreResult<Option<Document>> {
        self.store
            .find_one(ITEMS_COLLECTION, &Self::owned_by_id(owner, id))
            .await
    }

    /// Insert an item for `owner`; `Conflict` if the title already exists.
    pub async fn create(&self, owner: &str, mut body: DocumentBody) -> StoreResult<Document> {
        body.insert(OWNER_FIELD.into(), Value::from(owner));
        let unique = Filter::all().eq("title", body.get("title").cloned().unwrap_or(Value::Null));

        let id = self
            .store
            .insert(ITEMS_COLLECTION, Some(&unique), body)
            .await?;
        self.store
            .find_one(ITEMS_COLLECTION, &Filter::by_id(id))
            .await?
            .ok_or_else(|| StoreError::not_found(ITEMS_COLLECTION))
    }

    /// Replace an owned item's body; the owner cannot be reassigned.
    pub async fn update(
        &self,
        owner: &str,
        id: &str,
        mut body: DocumentBody,
    ) -> StoreResult<Document> {
        body.insert(OWNER_FIELD.into(), Value::from(owner));
        self.store
            .replace_one(ITEMS_COLLECTION, &Self::owned_by_id(owner, id), body)
            .await
    }

    /// Delete an owned item.
    pub async fn delete(&self, owner: &str, id: &str) -> StoreResult<()> {
        self.store
            .delete_one(ITEMS_COLLECTION, &Self::owned_by_id(owner, id))
            .await
    }
}
