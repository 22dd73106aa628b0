//! PostgreSQL document store with JSONB bodies.
//!
//! Every collection lives in the single `documents` table; `seq` preserves
//! insertion order. Filters are compiled into `WHERE` clauses with
//! [`QueryBuilder`] so field names and values are always bound parameters.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{debug, error};
use uuid::Uuid;

use gamerent_core::error::StoreError;
use gamerent_core::result::StoreResult;
use gamerent_core::traits::DocumentStore;
use gamerent_core::types::document::strip_reserved;
use gamerent_core::types::{Document, DocumentBody, DocumentId, Filter, FilterOp, Pagination};

use super::matcher::close_trailing_escape;

const COLUMNS: &str = "id, version, modified_at, body";

/// Row shape shared by every `SELECT`/`RETURNING`.
#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: Uuid,
    version: i64,
    modified_at: DateTime<Utc>,
    body: Json<DocumentBody>,
}

impl From<DocumentRow> for Document {
    fn from(row: DocumentRow) -> Self {
        Self {
            id: DocumentId::from_uuid(row.id),
            version: row.version,
            modified_at: row.modified_at,
            body: row.body.0,
        }
    }
}

/// [`DocumentStore`] backed by a PostgreSQL pool.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Create a store over an already-migrated pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Append `WHERE collection = .. AND <conditions>` to `qb`.
fn push_where(qb: &mut QueryBuilder<'_, Postgres>, collection: &str, filter: &Filter) {
    qb.push(" WHERE collection = ").push_bind(collection.to_string());

    for field in &filter.fields {
        qb.push(" AND ");
        let pattern_op = match field.op {
            FilterOp::Eq => None,
            FilterOp::Like => Some(" LIKE "),
            FilterOp::ILike => Some(" ILIKE "),
        };

        match (field.field.as_str(), pattern_op, &field.value) {
            ("_id", None, Value::String(raw)) => match Uuid::parse_str(raw) {
                Ok(id) => {
                    qb.push("id = ").push_bind(id);
                }
                Err(_) => {
                    qb.push("FALSE");
                }
            },
            ("_id", Some(op), Value::String(pattern)) => {
                qb.push("id::text")
                    .push(op)
                    .push_bind(close_trailing_escape(pattern).into_owned());
            }
            ("version", None, value) => match value.as_i64() {
                Some(version) => {
                    qb.push("version = ").push_bind(version);
                }
                None => {
                    qb.push("FALSE");
                }
            },
            (name, None, value) => {
                qb.push("body -> ")
                    .push_bind(name.to_string())
                    .push(" = ")
                    .push_bind(Json(value.clone()));
            }
            (name, Some(op), Value::String(pattern)) => {
                qb.push("body ->> ")
                    .push_bind(name.to_string())
                    .push(op)
                    .push_bind(close_trailing_escape(pattern).into_owned());
            }
            _ => {
                qb.push("FALSE");
            }
        }
    }
}

/// Append a subquery selecting the `seq` of the first match.
fn push_first_match(qb: &mut QueryBuilder<'_, Postgres>, collection: &str, filter: &Filter) {
    qb.push("(SELECT seq FROM documents");
    push_where(qb, collection, filter);
    qb.push(" ORDER BY seq LIMIT 1)");
}

fn map_sqlx(collection: &str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            return StoreError::conflict(collection);
        }
    }
    error!(collection, error = %err, "Document store query failed");
    StoreError::Transport(err.to_string())
}

fn to_i64(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn query(
        &self,
        collection: &str,
        filter: &Filter,
        pagination: Option<Pagination>,
    ) -> StoreResult<Vec<Document>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM documents"));
        push_where(&mut qb, collection, filter);
        qb.push(" ORDER BY seq");

        if let Some(page) = pagination {
            qb.push(" OFFSET ").push_bind(to_i64(page.skip));
            if let Some(limit) = page.limit {
                qb.push(" LIMIT ").push_bind(to_i64(limit));
            }
        }

        let rows = qb
            .build_query_as::<DocumentRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx(collection, e))?;
        Ok(rows.into_iter().map(Document::from).collect())
    }

    async fn insert(
        &self,
        collection: &str,
        unique: Option<&Filter>,
        body: DocumentBody,
    ) -> StoreResult<DocumentId> {
        if let Some(unique) = unique {
            let mut qb = QueryBuilder::<Postgres>::new("SELECT EXISTS(SELECT 1 FROM documents");
            push_where(&mut qb, collection, unique);
            qb.push(")");
            let exists: bool = qb
                .build_query_scalar::<bool>()
                .fetch_one(&self.pool)
                .await
                .map_err(|e| map_sqlx(collection, e))?;
            if exists {
                debug!(collection, "Insert rejected by uniqueness filter");
                return Err(StoreError::conflict(collection));
            }
        }

        let doc = Document::new(body);
        sqlx::query(
            "INSERT INTO documents (collection, id, version, modified_at, body) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(collection)
        .bind(doc.id.as_uuid())
        .bind(doc.version)
        .bind(doc.modified_at)
        .bind(Json(&doc.body))
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx(collection, e))?;

        debug!(collection, id = %doc.id, "Document inserted");
        Ok(doc.id)
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> StoreResult<()> {
        let mut qb = QueryBuilder::<Postgres>::new("DELETE FROM documents WHERE seq = ");
        push_first_match(&mut qb, collection, filter);

        let result = qb
            .build()
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx(collection, e))?;
        if result.rows_affected() == 0 {
            return Err(StoreError::not_found(collection));
        }
        debug!(collection, "Document deleted");
        Ok(())
    }

    async fn replace_one(
        &self,
        collection: &str,
        filter: &Filter,
        body: DocumentBody,
    ) -> StoreResult<Document> {
        let body = strip_reserved(body);

        let mut qb = QueryBuilder::<Postgres>::new("UPDATE documents SET body = ");
        qb.push_bind(Json(body.clone()))
            .push(", version = version + 1, modified_at = NOW() WHERE seq = ");
        push_first_match(&mut qb, collection, filter);
        qb.push(" AND body IS DISTINCT FROM ")
            .push_bind(Json(body))
            .push(format!(" RETURNING {COLUMNS}"));

        let row = qb
            .build_query_as::<DocumentRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx(collection, e))?
            .ok_or_else(|| StoreError::not_found(collection))?;

        let doc = Document::from(row);
        debug!(collection, id = %doc.id, version = doc.version, "Document replaced");
        Ok(doc)
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
