//! Request body extraction for content writes
//!
//! Write endpoints accept `application/json` or `multipart/form-data`.
//! Either way the handler receives a [`RawUpdate`]: JSON members or multipart
//! text parts become fields, and file parts are written to the upload store
//! with only their public path handed on.
//!
//! Files are stored before the handler validates anything, so the handler
//! settles them afterwards: on success only files the written record
//! references are kept, on error all of them are removed.

use axum::{
    async_trait,
    body::Bytes,
    extract::{multipart::MultipartError, FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};
use scms_common::RawUpdate;
use serde_json::Value;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::uploads::{references, StoredFile, UploadStore};
use crate::AppState;

/// Extracted partial update and the files stored while reading it
#[derive(Debug, Clone)]
pub struct UpdateBody {
    pub update: RawUpdate,
    stored: Vec<StoredFile>,
    store: UploadStore,
}

impl UpdateBody {
    fn new(update: RawUpdate, stored: Vec<StoredFile>, store: &UploadStore) -> Self {
        Self {
            update,
            stored,
            store: store.clone(),
        }
    }

    /// Keep files `record` refers to when the write succeeded, drop the rest
    ///
    /// `record` is the document the handler is about to return.
    pub async fn settle<T>(&self, result: ApiResult<T>, record: impl FnOnce(&T) -> Value) -> ApiResult<T> {
        let written = match &result {
            Ok(value) => record(value),
            Err(_) => Value::Null,
        };
        for file in &self.stored {
            if !references(&written, &file.path) {
                self.store.remove(file).await;
            }
        }
        result
    }
}

#[async_trait]
impl FromRequest<AppState> for UpdateBody {
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?;
            let mut stored = Vec::new();
            return match read_multipart(multipart, &state.uploads, &mut stored).await {
                Ok(update) => Ok(UpdateBody::new(update, stored, &state.uploads)),
                Err(e) => {
                    for file in &stored {
                        state.uploads.remove(file).await;
                    }
                    Err(e)
                }
            };
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::from_rejection(e.status(), e.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(UpdateBody::new(RawUpdate::new(), Vec::new(), &state.uploads));
        }

        if !content_type.is_empty() && !content_type.starts_with("application/json") {
            return Err(ApiError::UnsupportedMediaType(format!(
                "Expected application/json or multipart/form-data, got {}",
                content_type
            )));
        }

        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| ApiError::BadRequest(format!("Invalid JSON body: {}", e)))?;

        RawUpdate::from_json(value)
            .map(|update| UpdateBody::new(update, Vec::new(), &state.uploads))
            .ok_or_else(|| ApiError::BadRequest("JSON body must be an object".to_string()))
    }
}

fn multipart_error(err: MultipartError) -> ApiError {
    ApiError::from_rejection(err.status(), err.body_text())
}

/// Drain a multipart form into a [`RawUpdate`], storing file parts
///
/// Every file written is pushed onto `stored`, also when a later part fails.
async fn read_multipart(
    mut multipart: Multipart,
    uploads: &UploadStore,
    stored: &mut Vec<StoredFile>,
) -> Result<RawUpdate, ApiError> {
    let mut update = RawUpdate::new();

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                let bytes = field.bytes().await.map_err(multipart_error)?;
                // A file input left empty still submits a part with no content
                if bytes.is_empty() {
                    debug!("Skipping empty file part '{}'", name);
                    continue;
                }
                let file = uploads.store(&file_name, &bytes).await?;
                update.uploads.insert(name, file.path.clone());
                stored.push(file);
            }
            None => {
                let text = field.text().await.map_err(multipart_error)?;
                update.fields.insert(name, Value::String(text));
            }
        }
    }

    debug!(
        fields = update.fields.len(),
        uploads = update.uploads.len(),
        "Decoded multipart update"
    );
    Ok(update)
}
