//! Singleton section endpoints
//!
//! Writes run the partial-merge resolver against the section's active record
//! (or a record named by id), persist the result, and answer with the record
//! as re-read from the database.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use scms_common::merge::{resolve, MergeWarning, Outcome, SectionContent, SectionSchema};
use scms_common::RawUpdate;
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use super::parse_id;
use crate::db::sections;
use crate::error::{ApiError, ApiResult};
use crate::extract::UpdateBody;
use crate::AppState;

/// Section listing entry
#[derive(Debug, Serialize)]
pub struct SectionInfo {
    pub name: &'static str,
    pub label: &'static str,
    pub fields: Vec<&'static str>,
}

/// Response to a section write
#[derive(Debug, Serialize)]
pub struct WriteResponse {
    pub record: Value,
    /// Update fields that could not be used and kept their stored value
    pub warnings: Vec<String>,
}

fn schema_for(section: &str) -> ApiResult<&'static SectionSchema> {
    SectionSchema::lookup(section)
        .ok_or_else(|| ApiError::NotFound(format!("Unknown section: {}", section)))
}

/// GET /api/sections
pub async fn list_sections() -> Json<Vec<SectionInfo>> {
    Json(
        SectionSchema::all()
            .iter()
            .map(|schema| SectionInfo {
                name: schema.name,
                label: schema.label,
                fields: schema.field_names(),
            })
            .collect(),
    )
}

/// GET /api/sections/:section
pub async fn get_section(
    State(state): State<AppState>,
    Path(section): Path<String>,
) -> ApiResult<Json<Value>> {
    let schema = schema_for(&section)?;
    let row = sections::find_active_row(&state.db, schema.name)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("No active {} record", schema.name)))?;

    Ok(Json(row.decode_for_read(schema).to_json()))
}

/// GET /api/sections/:section/records
pub async fn list_records(
    State(state): State<AppState>,
    Path(section): Path<String>,
) -> ApiResult<Json<Vec<Value>>> {
    let schema = schema_for(&section)?;
    let rows = sections::list_rows(&state.db, schema.name).await?;

    Ok(Json(
        rows.iter()
            .map(|row| row.decode_for_read(schema).to_json())
            .collect(),
    ))
}

/// POST /api/sections/:section
///
/// Creates the section's record on first write (201), otherwise merges into
/// the active record (200).
pub async fn upsert_section(
    State(state): State<AppState>,
    Path(section): Path<String>,
    body: UpdateBody,
) -> ApiResult<(StatusCode, Json<WriteResponse>)> {
    let result = merge_into_active(&state, &section, &body.update).await;
    body.settle(result, |(_, Json(response))| response.record.clone())
        .await
}

async fn merge_into_active(
    state: &AppState,
    section: &str,
    update: &RawUpdate,
) -> ApiResult<(StatusCode, Json<WriteResponse>)> {
    let schema = schema_for(section)?;
    let existing = sections::find_active_row(&state.db, schema.name)
        .await?
        .map(|row| row.decode_for_read(schema));

    let resolution = resolve(schema, existing.as_ref().map(|r| &r.content), update);

    let (id, status) = match (resolution.outcome, existing.as_ref()) {
        (Outcome::MergeAndUpdate, Some(record)) => {
            sections::update_data(&state.db, record.id, &resolution.content).await?;
            (record.id, StatusCode::OK)
        }
        _ => {
            let id = sections::insert(&state.db, schema, &resolution.content, true).await?;
            info!(section = schema.name, %id, "Created section record");
            (id, StatusCode::CREATED)
        }
    };

    respond(state, schema, id, &resolution.content, &resolution.warnings, status).await
}

/// PUT /api/sections/:section/records/:id
pub async fn update_record(
    State(state): State<AppState>,
    Path((section, id)): Path<(String, String)>,
    body: UpdateBody,
) -> ApiResult<(StatusCode, Json<WriteResponse>)> {
    let result = merge_into_record(&state, &section, &id, &body.update).await;
    body.settle(result, |(_, Json(response))| response.record.clone())
        .await
}

async fn merge_into_record(
    state: &AppState,
    section: &str,
    id: &str,
    update: &RawUpdate,
) -> ApiResult<(StatusCode, Json<WriteResponse>)> {
    let schema = schema_for(section)?;
    let id = parse_id(id)?;
    let existing = sections::find_row(&state.db, schema.name, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{} record {}", schema.name, id)))?
        .decode_for_read(schema);

    let resolution = resolve(schema, Some(&existing.content), update);
    if !sections::update_data(&state.db, id, &resolution.content).await? {
        return Err(ApiError::NotFound(format!("{} record {}", schema.name, id)));
    }

    respond(state, schema, id, &resolution.content, &resolution.warnings, StatusCode::OK).await
}

/// POST /api/sections/:section/records/:id/activate
pub async fn activate_record(
    State(state): State<AppState>,
    Path((section, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let schema = schema_for(&section)?;
    let id = parse_id(&id)?;
    if !sections::activate(&state.db, schema.name, id).await? {
        return Err(ApiError::NotFound(format!("{} record {}", schema.name, id)));
    }
    info!(section = schema.name, %id, "Activated section record");

    let row = sections::find_row(&state.db, schema.name, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("{} record {}", schema.name, id)))?;
    Ok(Json(row.decode_for_read(schema).to_json()))
}

/// DELETE /api/sections/:section/records/:id
pub async fn delete_record(
    State(state): State<AppState>,
    Path((section, id)): Path<(String, String)>,
) -> ApiResult<StatusCode> {
    let schema = schema_for(&section)?;
    let id = parse_id(&id)?;
    if !sections::delete(&state.db, schema.name, id).await? {
        return Err(ApiError::NotFound(format!("{} record {}", schema.name, id)));
    }
    info!(section = schema.name, %id, "Deleted section record");
    Ok(StatusCode::NO_CONTENT)
}

async fn respond(
    state: &AppState,
    schema: &SectionSchema,
    id: Uuid,
    written: &SectionContent,
    warnings: &[MergeWarning],
    status: StatusCode,
) -> ApiResult<(StatusCode, Json<WriteResponse>)> {
    let record = sections::reload_after_write(&state.db, schema, id, written).await?;

    Ok((
        status,
        Json(WriteResponse {
            record: record.to_json(),
            warnings: warnings.iter().map(ToString::to_string).collect(),
        }),
    ))
}

pub fn section_routes() -> Router<AppState> {
    Router::new()
        .route("/api/sections", get(list_sections))
        .route("/api/sections/:section", get(get_section).post(upsert_section))
        .route("/api/sections/:section/records", get(list_records))
        .route(
            "/api/sections/:section/records/:id",
            put(update_record).delete(delete_record),
        )
        .route(
            "/api/sections/:section/records/:id/activate",
            post(activate_record),
        )
}
