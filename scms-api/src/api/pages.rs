//! Dynamic page endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use scms_common::RawUpdate;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::db::pages;
use crate::error::{ApiError, ApiResult};
use crate::extract::UpdateBody;
use crate::models::{DynamicPage, PageDraft};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    /// Hide unpublished pages
    #[serde(default)]
    pub published: bool,
}

async fn page_by_slug(state: &AppState, slug: &str) -> ApiResult<DynamicPage> {
    pages::get_by_slug(&state.db, slug)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Page not found: {}", slug)))
}

/// GET /api/pages
pub async fn list_pages(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<DynamicPage>>> {
    Ok(Json(pages::list(&state.db, query.published).await?))
}

/// GET /api/pages/:slug
pub async fn get_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<DynamicPage>> {
    Ok(Json(page_by_slug(&state, &slug).await?))
}

/// POST /api/pages
///
/// Pages have no upload fields; file parts sent along are discarded.
pub async fn create_page(
    State(state): State<AppState>,
    body: UpdateBody,
) -> ApiResult<(StatusCode, Json<DynamicPage>)> {
    let result = insert_page(&state, &body.update).await;
    body.settle(result, |(_, Json(page))| page_document(page)).await
}

async fn insert_page(state: &AppState, update: &RawUpdate) -> ApiResult<(StatusCode, Json<DynamicPage>)> {
    let draft = PageDraft::create(update).map_err(ApiError::BadRequest)?;
    let page = pages::insert(&state.db, &draft).await?;
    info!(slug = %page.slug, id = %page.id, "Created page");

    Ok((StatusCode::CREATED, Json(page)))
}

/// PUT /api/pages/:slug
///
/// Fields absent from the update keep their value; `slug` may be changed.
pub async fn update_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    body: UpdateBody,
) -> ApiResult<Json<DynamicPage>> {
    let result = replace_page(&state, &slug, &body.update).await;
    body.settle(result, |Json(page)| page_document(page)).await
}

async fn replace_page(state: &AppState, slug: &str, update: &RawUpdate) -> ApiResult<Json<DynamicPage>> {
    let existing = page_by_slug(state, slug).await?;
    let draft = PageDraft::merge(&existing, update).map_err(ApiError::BadRequest)?;

    let page = pages::update(&state.db, existing.id, &draft)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Page not found: {}", slug)))?;
    Ok(Json(page))
}

/// DELETE /api/pages/:slug
pub async fn delete_page(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<StatusCode> {
    let existing = page_by_slug(&state, &slug).await?;
    if !pages::delete(&state.db, existing.id).await? {
        return Err(ApiError::NotFound(format!("Page not found: {}", slug)));
    }
    info!(slug = %slug, "Deleted page");
    Ok(StatusCode::NO_CONTENT)
}

fn page_document(page: &DynamicPage) -> Value {
    serde_json::to_value(page).unwrap_or_default()
}

pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/api/pages", get(list_pages).post(create_page))
        .route(
            "/api/pages/:slug",
            get(get_page).put(update_page).delete(delete_page),
        )
}
