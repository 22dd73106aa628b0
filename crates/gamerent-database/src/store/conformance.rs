//! Behavior every [`DocumentStore`] backend must share.
//!
//! The memory backend always runs these. The PostgreSQL backend runs them
//! when `GAMERENT_TEST_DATABASE_URL` points at a scratch database.

use serde_json::{Value, json};
use sqlx::postgres::PgPoolOptions;
use uuid::Uuid;

use gamerent_core::error::StoreError;
use gamerent_core::traits::DocumentStore;
use gamerent_core::types::{DocumentBody, Filter, Pagination};

use super::{MemoryDocumentStore, PgDocumentStore};
use crate::migration::run_migrations;

fn body(value: Value) -> DocumentBody {
    value.as_object().cloned().unwrap()
}

/// Unique per run, so a shared database never sees stale rows.
fn scratch(prefix: &str) -> String {
    format!("{prefix}-{}", Uuid::new_v4().simple())
}

async fn unique_insert_conflicts_without_write(store: &dyn DocumentStore) {
    let collection = scratch("conformance");
    let unique = Filter::all().eq("title", "Zelda");

    store
        .insert(&collection, Some(&unique), body(json!({"title": "Zelda"})))
        .await
        .unwrap();
    let err = store
        .insert(&collection, Some(&unique), body(json!({"title": "Zelda", "n": 2})))
        .await
        .unwrap_err();

    assert_eq!(err, StoreError::conflict(&collection));
    let all = store.query(&collection, &Filter::all(), None).await.unwrap();
    assert_eq!(all.len(), 1);
}

async fn query_keeps_insertion_order(store: &dyn DocumentStore) {
    let collection = scratch("conformance");
    for title in ["Zelda", "Metroid", "Zool", "Zork"] {
        store
            .insert(&collection, None, body(json!({"title": title})))
            .await
            .unwrap();
    }

    let page = store
        .query(
            &collection,
            &Filter::all().ilike("title", "z%"),
            Some(Pagination::new(1, Some(2))),
        )
        .await
        .unwrap();
    let titles: Vec<_> = page.iter().filter_map(|d| d.get_str("title")).collect();
    assert_eq!(titles, vec!["Zool", "Zork"]);
}

async fn trailing_backslash_is_literal(store: &dyn DocumentStore) {
    let collection = scratch("conformance");
    store
        .insert(&collection, None, body(json!({"title": "abc\\"})))
        .await
        .unwrap();
    store
        .insert(&collection, None, body(json!({"title": "abcd"})))
        .await
        .unwrap();

    let found = store
        .query(&collection, &Filter::all().like("title", "abc\\"), None)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get_str("title"), Some("abc\\"));
}

async fn replace_and_delete_classify_no_match(store: &dyn DocumentStore) {
    let collection = scratch("conformance");
    let id = store
        .insert(&collection, None, body(json!({"title": "Zelda"})))
        .await
        .unwrap();

    let updated = store
        .replace_one(&collection, &Filter::by_id(id), body(json!({"title": "Zelda II"})))
        .await
        .unwrap();
    assert_eq!(updated.version, 2);

    let noop = store
        .replace_one(&collection, &Filter::by_id(id), body(json!({"title": "Zelda II"})))
        .await
        .unwrap_err();
    assert_eq!(noop.status_code(), 400);

    store.delete_one(&collection, &Filter::by_id(id)).await.unwrap();
    let gone = store
        .delete_one(&collection, &Filter::by_id(id))
        .await
        .unwrap_err();
    assert_eq!(gone, StoreError::not_found(&collection));
}

/// Uniqueness is checked on insert only; a replace may take a key that
/// another document already holds.
async fn replace_may_reuse_a_taken_key(store: &dyn DocumentStore) {
    let taken = scratch("Zelda");
    let other = scratch("Metroid");
    let unique = |title: &str| Filter::all().eq("title", title);

    store
        .insert("items", Some(&unique(&taken)), body(json!({"title": taken})))
        .await
        .unwrap();
    let id = store
        .insert("items", Some(&unique(&other)), body(json!({"title": other})))
        .await
        .unwrap();

    let renamed = store
        .replace_one("items", &Filter::by_id(id), body(json!({"title": taken})))
        .await
        .unwrap();
    assert_eq!(renamed.get_str("title"), Some(taken.as_str()));
    assert_eq!(renamed.version, 2);

    let err = store
        .insert("items", Some(&unique(&taken)), body(json!({"title": taken})))
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 409);
}

async fn run_all(store: &dyn DocumentStore) {
    unique_insert_conflicts_without_write(store).await;
    query_keeps_insertion_order(store).await;
    trailing_backslash_is_literal(store).await;
    replace_and_delete_classify_no_match(store).await;
    replace_may_reuse_a_taken_key(store).await;
}

#[tokio::test]
async fn test_memory_store_conformance() {
    run_all(&MemoryDocumentStore::new()).await;
}

#[tokio::test]
async fn test_postgres_store_conformance() {
    let Ok(url) = std::env::var("GAMERENT_TEST_DATABASE_URL") else {
        eprintln!("GAMERENT_TEST_DATABASE_URL not set, skipping");
        return;
    };
    let pool = PgPoolOptions::new()
        .max_connections(4)
        .connect(&url)
        .await
        .unwrap();
    run_migrations(&pool).await.unwrap();
    let store = PgDocumentStore::new(pool.clone());

    run_all(&store).await;

    // The insert trigger still rejects a duplicate key when the caller
    // skips the uniqueness pre-check.
    let title = scratch("Zelda");
    store
        .insert("items", None, body(json!({"title": title})))
        .await
        .unwrap();
    let err = store
        .insert("items", None, body(json!({"title": title})))
        .await
        .unwrap_err();
    assert_eq!(err, StoreError::conflict("items"));
}
