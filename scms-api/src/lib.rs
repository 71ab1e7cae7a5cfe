//! scms-api library - site content management service
//!
//! REST endpoints for the nonprofit site's content: singleton sections
//! (merged through `scms_common::merge`), collections, dynamic pages and
//! uploaded files.

use axum::{extract::DefaultBodyLimit, routing::get, Router};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

pub mod api;
pub mod db;
pub mod error;
pub mod extract;
pub mod models;
pub mod uploads;

pub use error::{ApiError, ApiResult};
use uploads::UploadStore;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Where uploaded files are written and served from
    pub uploads: UploadStore,
    /// Largest accepted request body, uploads included
    pub max_body_bytes: usize,
    pub startup_time: DateTime<Utc>,
}

impl AppState {
    pub fn new(db: SqlitePool, uploads: UploadStore, max_body_bytes: usize) -> Self {
        Self {
            db,
            uploads,
            max_body_bytes,
            startup_time: Utc::now(),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let uploads_dir = state.uploads.dir().to_path_buf();
    let body_limit = state.max_body_bytes;

    Router::new()
        .merge(api::health_routes())
        .route("/build_info", get(api::get_build_info))
        .merge(api::section_routes())
        .merge(api::collection_routes())
        .merge(api::page_routes())
        .merge(api::upload_routes())
        .nest_service(uploads::PUBLIC_PREFIX, ServeDir::new(uploads_dir))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        // Admin dashboard is served from a different origin
        .layer(CorsLayer::permissive())
}
