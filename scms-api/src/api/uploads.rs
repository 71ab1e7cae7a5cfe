//! Standalone file upload endpoint
//!
//! Admin forms that upload an image before saving the record post it here
//! and put the returned path in a URL field.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::uploads::{StoredFile, UploadStore};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct UploadedFile {
    pub field: String,
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub files: Vec<UploadedFile>,
}

/// POST /api/uploads
pub async fn upload_files(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let multipart = multipart.map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?;

    let mut files = Vec::new();
    if let Err(e) = store_file_parts(multipart, &state.uploads, &mut files).await {
        for (_, stored) in &files {
            state.uploads.remove(stored).await;
        }
        return Err(e);
    }

    if files.is_empty() {
        return Err(ApiError::BadRequest("No file parts in upload".to_string()));
    }

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            files: files
                .into_iter()
                .map(|(field, stored)| UploadedFile {
                    field,
                    path: stored.path,
                })
                .collect(),
        }),
    ))
}

async fn store_file_parts(
    mut multipart: Multipart,
    uploads: &UploadStore,
    files: &mut Vec<(String, StoredFile)>,
) -> ApiResult<()> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            debug!("Ignoring text part {:?} in upload", field.name());
            continue;
        };
        let field_name = field.name().unwrap_or("file").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?;
        if bytes.is_empty() {
            continue;
        }

        let stored = uploads.store(&file_name, &bytes).await?;
        files.push((field_name, stored));
    }
    Ok(())
}

pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/api/uploads", post(upload_files))
}
