//! Catalog handlers. Every item is scoped to the calling identity, and
//! mutations are announced to that identity's real-time connections.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use serde_json::{Map, Value};
use tracing::{debug, info};

use gamerent_core::error::AppError;
use gamerent_core::traits::StoreOp;
use gamerent_core::types::{Document, DocumentBody};
use gamerent_realtime::{Message, MessageBody};

use crate::dto::response::DeletedResponse;
use crate::error::success_status;
use crate::extractors::{AuthUser, ItemQuery};
use crate::state::AppState;

/// Accepts only JSON objects carrying a string `title`.
fn item_body(value: Value) -> Result<DocumentBody, AppError> {
    let Value::Object(body) = value else {
        return Err(AppError::validation("Item must be a JSON object"));
    };
    match body.get("title") {
        Some(Value::String(title)) if !title.trim().is_empty() => Ok(body),
        _ => Err(AppError::validation("Item requires a non-empty string 'title'")),
    }
}

fn payload(doc: &Document) -> Result<Map<String, Value>, AppError> {
    match serde_json::to_value(doc)? {
        Value::Object(map) => Ok(map),
        _ => Err(AppError::internal("Item did not serialize to an object")),
    }
}

async fn announce(state: &AppState, identity: &str, body: MessageBody) {
    let report = state
        .realtime
        .notify_identity(identity, &Message::from_server(body))
        .await;
    debug!(
        identity,
        delivered = report.delivered,
        evicted = report.evicted.len(),
        "Item event broadcast"
    );
}

/// GET /api/items
pub async fn list_items(
    State(state): State<AppState>,
    auth: AuthUser,
    Query(query): Query<ItemQuery>,
) -> Result<(StatusCode, Json<Vec<Document>>), AppError> {
    let items = state
        .items
        .list(&auth.identity, query.title_pattern(), query.pagination())
        .await?;
    Ok((success_status(StoreOp::Query), Json(items)))
}

/// GET /api/items/{id}
pub async fn get_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Document>, AppError> {
    state
        .items
        .get(&auth.identity, &id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found(format!("Item '{id}' not found")))
}

/// POST /api/items
pub async fn create_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Document>), AppError> {
    let body = item_body(body)?;
    let doc = state.items.create(&auth.identity, body).await?;
    info!(identity = %auth.identity, item_id = %doc.id, "Item created");

    announce(&state, &auth.identity, MessageBody::ItemCreated(payload(&doc)?)).await;
    Ok((success_status(StoreOp::Insert), Json(doc)))
}

/// PUT /api/items/{id}
pub async fn update_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Document>), AppError> {
    let body = item_body(body)?;
    let doc = state.items.update(&auth.identity, &id, body).await?;
    info!(identity = %auth.identity, item_id = %doc.id, version = doc.version, "Item updated");

    announce(&state, &auth.identity, MessageBody::ItemUpdated(payload(&doc)?)).await;
    Ok((success_status(StoreOp::Replace), Json(doc)))
}

/// DELETE /api/items/{id}
pub async fn delete_item(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<DeletedResponse>), AppError> {
    state.items.delete(&auth.identity, &id).await?;
    info!(identity = %auth.identity, item_id = %id, "Item deleted");

    announce(&state, &auth.identity, MessageBody::ItemDeleted(id.clone())).await;
    Ok((success_status(StoreOp::Delete), Json(DeletedResponse { id })))
}
