//! Collection endpoints (testimonials, staff, press, impact stats, social posts)

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use scms_common::RawUpdate;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;
use uuid::Uuid;

use super::parse_id;
use crate::db::collections;
use crate::error::{ApiError, ApiResult};
use crate::extract::UpdateBody;
use crate::models::collections::{apply_update, is_active};
use crate::models::CollectionKind;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Only items with `isActive: true`
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Deserialize)]
pub struct ReorderRequest {
    pub ids: Vec<Uuid>,
}

fn kind_for(collection: &str) -> ApiResult<CollectionKind> {
    CollectionKind::from_slug(collection)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown collection: {}", collection)))
}

fn item_not_found(kind: CollectionKind, id: Uuid) -> ApiError {
    ApiError::NotFound(format!("{} item {}", kind.slug(), id))
}

/// GET /api/collections/:collection
pub async fn list_items(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<Value>>> {
    let kind = kind_for(&collection)?;
    let rows = collections::list(&state.db, kind).await?;

    Ok(Json(
        rows.iter()
            .filter(|row| !query.active || is_active(&row.data))
            .map(|row| row.to_json())
            .collect(),
    ))
}

/// GET /api/collections/:collection/items/:id
pub async fn get_item(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let kind = kind_for(&collection)?;
    let id = parse_id(&id)?;
    let row = collections::get(&state.db, kind, id)
        .await?
        .ok_or_else(|| item_not_found(kind, id))?;

    Ok(Json(row.to_json()))
}

/// POST /api/collections/:collection
pub async fn create_item(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    body: UpdateBody,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let result = insert_item(&state, &collection, &body.update).await;
    body.settle(result, |(_, Json(item))| item.clone()).await
}

async fn insert_item(
    state: &AppState,
    collection: &str,
    update: &RawUpdate,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let kind = kind_for(collection)?;
    let doc = kind
        .canonicalize(apply_update(Map::new(), update))
        .map_err(ApiError::BadRequest)?;

    let row = collections::insert(&state.db, kind, &doc).await?;
    info!(collection = kind.slug(), id = %row.id, "Created collection item");

    Ok((StatusCode::CREATED, Json(row.to_json())))
}

/// PUT /api/collections/:collection/items/:id
///
/// Top-level keys present in the update replace the stored ones; the result
/// is validated as a whole.
pub async fn update_item(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
    body: UpdateBody,
) -> ApiResult<Json<Value>> {
    let result = replace_item(&state, &collection, &id, &body.update).await;
    body.settle(result, |Json(item)| item.clone()).await
}

async fn replace_item(
    state: &AppState,
    collection: &str,
    id: &str,
    update: &RawUpdate,
) -> ApiResult<Json<Value>> {
    let kind = kind_for(collection)?;
    let id = parse_id(id)?;
    let existing = collections::get(&state.db, kind, id)
        .await?
        .ok_or_else(|| item_not_found(kind, id))?;

    let doc = kind
        .canonicalize(apply_update(existing.data, update))
        .map_err(ApiError::BadRequest)?;

    if !collections::update(&state.db, kind, id, &doc).await? {
        return Err(item_not_found(kind, id));
    }

    let row = collections::get(&state.db, kind, id)
        .await?
        .ok_or_else(|| item_not_found(kind, id))?;
    Ok(Json(row.to_json()))
}

/// DELETE /api/collections/:collection/items/:id
pub async fn delete_item(
    State(state): State<AppState>,
    Path((collection, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let kind = kind_for(&collection)?;
    let id = parse_id(&id)?;
    if !collections::delete(&state.db, kind, id).await? {
        return Err(item_not_found(kind, id));
    }
    info!(collection = kind.slug(), %id, "Deleted collection item");
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/collections/:collection/order
pub async fn reorder_items(
    State(state): State<AppState>,
    Path(collection): Path<String>,
    payload: Result<Json<ReorderRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<Value>>> {
    let kind = kind_for(&collection)?;
    let Json(request) = payload.map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?;
    collections::reorder(&state.db, kind, &request.ids).await?;

    let rows = collections::list(&state.db, kind).await?;
    Ok(Json(rows.iter().map(|row| row.to_json()).collect()))
}

pub fn collection_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/api/collections/:collection",
            get(list_items).post(create_item),
        )
        .route(
            "/api/collections/:collection/items/:id",
            get(get_item).put(update_item).delete(delete_item),
        )
        .route("/api/collections/:collection/order", put(reorder_items))
}
