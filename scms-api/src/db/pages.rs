//! Dynamic page persistence

use chrono::Utc;
use scms_common::{Error, Result};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use super::{parse_guid, parse_timestamp, timestamp_text};
use crate::models::{ContentBlock, DynamicPage, PageDraft};

const SELECT_COLUMNS: &str = "SELECT guid, slug, title, description, blocks, is_published, created_at, updated_at FROM dynamic_pages";

fn page_from_row(row: &SqliteRow) -> Result<DynamicPage> {
    let guid: String = row.get("guid");
    let blocks: String = row.get("blocks");
    let is_published: i64 = row.get("is_published");
    let created_at: String = row.get("created_at");
    let updated_at: String = row.get("updated_at");

    let blocks: Vec<ContentBlock> = serde_json::from_str(&blocks)
        .map_err(|e| Error::Internal(format!("page {} has unreadable blocks: {}", guid, e)))?;

    Ok(DynamicPage {
        id: parse_guid(&guid)?,
        slug: row.get("slug"),
        title: row.get("title"),
        description: row.get("description"),
        blocks,
        is_published: is_published != 0,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

/// Turn a slug uniqueness violation into a conflict
fn map_slug_conflict(err: sqlx::Error, slug: &str) -> Error {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            Error::Conflict(format!("a page with slug '{}' already exists", slug))
        }
        _ => Error::Database(err),
    }
}

/// All pages by title; `published_only` hides drafts
pub async fn list(pool: &SqlitePool, published_only: bool) -> Result<Vec<DynamicPage>> {
    let sql = if published_only {
        format!("{} WHERE is_published = 1 ORDER BY title ASC", SELECT_COLUMNS)
    } else {
        format!("{} ORDER BY title ASC", SELECT_COLUMNS)
    };

    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    rows.iter().map(page_from_row).collect()
}

pub async fn get_by_slug(pool: &SqlitePool, slug: &str) -> Result<Option<DynamicPage>> {
    let row = sqlx::query(&format!("{} WHERE slug = ?", SELECT_COLUMNS))
        .bind(slug)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(page_from_row).transpose()
}

pub async fn get_by_id(pool: &SqlitePool, id: Uuid) -> Result<Option<DynamicPage>> {
    let row = sqlx::query(&format!("{} WHERE guid = ?", SELECT_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(page_from_row).transpose()
}

/// Insert a page; a taken slug is [`Error::Conflict`]
pub async fn insert(pool: &SqlitePool, draft: &PageDraft) -> Result<DynamicPage> {
    let id = Uuid::new_v4();
    let now = timestamp_text(Utc::now());

    sqlx::query(
        r#"
        INSERT INTO dynamic_pages (guid, slug, title, description, blocks, is_published, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(&draft.slug)
    .bind(&draft.title)
    .bind(&draft.description)
    .bind(serde_json::to_string(&draft.blocks)?)
    .bind(draft.is_published)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .map_err(|e| map_slug_conflict(e, &draft.slug))?;

    debug!(slug = %draft.slug, %id, "Inserted page");

    get_by_id(pool, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("page {} vanished after insert", id)))
}

/// Overwrite a page's fields; `None` if the page does not exist
pub async fn update(pool: &SqlitePool, id: Uuid, draft: &PageDraft) -> Result<Option<DynamicPage>> {
    let result = sqlx::query(
        r#"
        UPDATE dynamic_pages
        SET slug = ?, title = ?, description = ?, blocks = ?, is_published = ?, updated_at = ?
        WHERE guid = ?
        "#,
    )
    .bind(&draft.slug)
    .bind(&draft.title)
    .bind(&draft.description)
    .bind(serde_json::to_string(&draft.blocks)?)
    .bind(draft.is_published)
    .bind(timestamp_text(Utc::now()))
    .bind(id.to_string())
    .execute(pool)
    .await
    .map_err(|e| map_slug_conflict(e, &draft.slug))?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_by_id(pool, id).await
}

pub async fn delete(pool: &SqlitePool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM dynamic_pages WHERE guid = ?")
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
