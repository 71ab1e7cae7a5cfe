//! Singleton section record persistence
//!
//! The `data` column holds the flat document produced by the resolver. Reads
//! decode it strictly first; when the stored document has drifted (nested
//! fields re-serialized as strings, or worse) the decode falls back field by
//! field so a single bad field never takes the section offline.

use chrono::{DateTime, Utc};
use scms_common::merge::{SectionContent, SectionSchema, StoredFieldError};
use scms_common::{Error, Result};
use serde_json::{Map, Value};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{parse_guid, parse_timestamp, timestamp_text};

const SELECT_COLUMNS: &str =
    "SELECT guid, section, is_active, data, created_at, updated_at FROM section_records";

/// Section record as stored, before its document is decoded
#[derive(Debug, Clone)]
pub struct SectionRow {
    pub id: Uuid,
    pub section: String,
    pub is_active: bool,
    pub data: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SectionRow {
    fn from_row(row: &SqliteRow) -> Result<Self> {
        let guid: String = row.get("guid");
        let created_at: String = row.get("created_at");
        let updated_at: String = row.get("updated_at");
        let is_active: i64 = row.get("is_active");

        Ok(Self {
            id: parse_guid(&guid)?,
            section: row.get("section"),
            is_active: is_active != 0,
            data: row.get("data"),
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }

    /// Decode the stored document strictly
    pub fn decode(&self, schema: &SectionSchema) -> std::result::Result<SectionRecord, StoredFieldError> {
        let doc: Value = serde_json::from_str(&self.data).map_err(|e| StoredFieldError {
            field: schema.name.to_string(),
            reason: e.to_string(),
        })?;
        let content = SectionContent::from_stored(schema, &doc)?;
        Ok(self.with_content(content))
    }

    /// Decode the stored document, taking any unreadable field from `fallback`
    pub fn decode_lenient(&self, schema: &SectionSchema, fallback: &SectionContent) -> SectionRecord {
        let content = match serde_json::from_str::<Value>(&self.data) {
            Ok(doc) => {
                let (content, failures) = SectionContent::from_stored_lenient(schema, &doc, fallback);
                for failure in failures {
                    warn!(section = schema.name, id = %self.id, "{}", failure);
                }
                content
            }
            Err(e) => {
                warn!(
                    section = schema.name,
                    id = %self.id,
                    "Stored document is not JSON ({}); serving fallback content",
                    e
                );
                fallback.conformed(schema)
            }
        };
        self.with_content(content)
    }

    /// Strict decode, degrading to a lenient one over empty content
    pub fn decode_for_read(&self, schema: &SectionSchema) -> SectionRecord {
        match self.decode(schema) {
            Ok(record) => record,
            Err(e) => {
                warn!(section = schema.name, id = %self.id, "Re-parsing drifted record: {}", e);
                self.decode_lenient(schema, &SectionContent::empty(schema))
            }
        }
    }

    fn with_content(&self, content: SectionContent) -> SectionRecord {
        SectionRecord {
            id: self.id,
            section: self.section.clone(),
            is_active: self.is_active,
            content,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Section record with its canonical content
#[derive(Debug, Clone, PartialEq)]
pub struct SectionRecord {
    pub id: Uuid,
    pub section: String,
    pub is_active: bool,
    pub content: SectionContent,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SectionRecord {
    /// Response document: identity, content fields, then timestamps
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("id".to_string(), Value::String(self.id.to_string()));
        map.insert("section".to_string(), Value::String(self.section.clone()));
        map.insert("isActive".to_string(), Value::Bool(self.is_active));
        map.extend(self.content.to_json_map());
        map.insert(
            "createdAt".to_string(),
            Value::String(timestamp_text(self.created_at)),
        );
        map.insert(
            "updatedAt".to_string(),
            Value::String(timestamp_text(self.updated_at)),
        );
        Value::Object(map)
    }
}

fn encode(content: &SectionContent) -> Result<String> {
    Ok(serde_json::to_string(&Value::Object(content.to_json_map()))?)
}

/// Active record of a section
///
/// Several rows may be flagged active after a race between two first writes;
/// the most recently updated one is served.
pub async fn find_active_row(pool: &SqlitePool, section: &str) -> Result<Option<SectionRow>> {
    let row = sqlx::query(&format!(
        "{} WHERE section = ? AND is_active = 1 ORDER BY updated_at DESC, created_at DESC LIMIT 1",
        SELECT_COLUMNS
    ))
    .bind(section)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(SectionRow::from_row).transpose()
}

pub async fn find_row(pool: &SqlitePool, section: &str, id: Uuid) -> Result<Option<SectionRow>> {
    let row = sqlx::query(&format!("{} WHERE section = ? AND guid = ?", SELECT_COLUMNS))
        .bind(section)
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(SectionRow::from_row).transpose()
}

/// Every record of a section, newest first
pub async fn list_rows(pool: &SqlitePool, section: &str) -> Result<Vec<SectionRow>> {
    let rows = sqlx::query(&format!(
        "{} WHERE section = ? ORDER BY created_at DESC",
        SELECT_COLUMNS
    ))
    .bind(section)
    .fetch_all(pool)
    .await?;

    rows.iter().map(SectionRow::from_row).collect()
}

/// Only the raw stored document of a record
pub async fn fetch_raw_data(pool: &SqlitePool, id: Uuid) -> Result<Option<String>> {
    let data: Option<String> = sqlx::query_scalar("SELECT data FROM section_records WHERE guid = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    Ok(data)
}

/// Insert a new record and return its id
pub async fn insert(
    pool: &SqlitePool,
    schema: &SectionSchema,
    content: &SectionContent,
    is_active: bool,
) -> Result<Uuid> {
    let id = Uuid::new_v4();
    let now = timestamp_text(Utc::now());

    sqlx::query(
        r#"
        INSERT INTO section_records (guid, section, is_active, data, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(schema.name)
    .bind(is_active)
    .bind(encode(content)?)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    debug!(section = schema.name, %id, "Inserted section record");
    Ok(id)
}

/// Replace a record's document; `false` if the record does not exist
pub async fn update_data(pool: &SqlitePool, id: Uuid, content: &SectionContent) -> Result<bool> {
    let result = sqlx::query("UPDATE section_records SET data = ?, updated_at = ? WHERE guid = ?")
        .bind(encode(content)?)
        .bind(timestamp_text(Utc::now()))
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Make one record the section's only active record
pub async fn activate(pool: &SqlitePool, section: &str, id: Uuid) -> Result<bool> {
    let mut tx = pool.begin().await?;

    let exists: Option<String> =
        sqlx::query_scalar("SELECT guid FROM section_records WHERE section = ? AND guid = ?")
            .bind(section)
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await?;
    if exists.is_none() {
        tx.rollback().await?;
        return Ok(false);
    }

    sqlx::query("UPDATE section_records SET is_active = 0 WHERE section = ? AND guid != ?")
        .bind(section)
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE section_records SET is_active = 1, updated_at = ? WHERE guid = ?")
        .bind(timestamp_text(Utc::now()))
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(true)
}

pub async fn delete(pool: &SqlitePool, section: &str, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM section_records WHERE section = ? AND guid = ?")
        .bind(section)
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Re-read a record just written
///
/// The persisted document is decoded strictly. If that fails the raw document
/// is fetched again and decoded field by field, and any field that is still
/// unreadable is served as `written` (the content handed to the write).
pub async fn reload_after_write(
    pool: &SqlitePool,
    schema: &SectionSchema,
    id: Uuid,
    written: &SectionContent,
) -> Result<SectionRecord> {
    let row = find_row(pool, schema.name, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("{} record {} vanished after write", schema.name, id)))?;

    match row.decode(schema) {
        Ok(record) => Ok(record),
        Err(e) => {
            warn!(section = schema.name, %id, "Strict re-read failed: {}", e);
            let raw = fetch_raw_data(pool, id).await?.unwrap_or_else(|| row.data.clone());
            let refetched = SectionRow { data: raw, ..row };
            Ok(refetched.decode_lenient(schema, written))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use scms_common::{resolve, RawUpdate};
    use serde_json::json;

    fn about() -> &'static SectionSchema {
        SectionSchema::lookup("about").unwrap()
    }

    fn sample_content() -> SectionContent {
        let update = RawUpdate::new()
            .with_field("badge", "Hero")
            .with_field("whoWeAre", json!({"badge": "Story"}))
            .with_field("values", json!([{"title": "Care", "description": "We care"}]));
        resolve(about(), None, &update).content
    }

    async fn store_raw(pool: &SqlitePool, id: Uuid, data: &str) {
        sqlx::query("UPDATE section_records SET data = ? WHERE guid = ?")
            .bind(data)
            .bind(id.to_string())
            .execute(pool)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_insert_and_find_active() {
        let pool = test_pool().await;
        let content = sample_content();

        let id = insert(&pool, about(), &content, true).await.unwrap();
        let row = find_active_row(&pool, "about").await.unwrap().unwrap();

        assert_eq!(row.id, id);
        assert_eq!(row.decode(about()).unwrap().content, content);
        assert!(find_active_row(&pool, "vmv").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_activate_leaves_single_active_record() {
        let pool = test_pool().await;
        let first = insert(&pool, about(), &sample_content(), true).await.unwrap();
        let second = insert(&pool, about(), &sample_content(), true).await.unwrap();

        assert!(activate(&pool, "about", first).await.unwrap());

        let rows = list_rows(&pool, "about").await.unwrap();
        let active: Vec<Uuid> = rows.iter().filter(|r| r.is_active).map(|r| r.id).collect();
        assert_eq!(active, vec![first]);
        assert!(rows.iter().any(|r| r.id == second && !r.is_active));

        assert!(!activate(&pool, "about", Uuid::new_v4()).await.unwrap());
        assert!(!activate(&pool, "vmv", first).await.unwrap());
    }

    #[tokio::test]
    async fn test_reload_reparses_string_encoded_fields() {
        let pool = test_pool().await;
        let content = sample_content();
        let id = insert(&pool, about(), &content, true).await.unwrap();

        let drifted = json!({
            "badge": "Hero",
            "whoWeAre": json!({"badge": "Story"}).to_string(),
            "values": json!([{"title": "Care", "description": "We care"}]).to_string(),
        });
        store_raw(&pool, id, &drifted.to_string()).await;

        let record = reload_after_write(&pool, about(), id, &content).await.unwrap();
        assert_eq!(record.content, content);
    }

    #[tokio::test]
    async fn test_reload_falls_back_to_written_content_per_field() {
        let pool = test_pool().await;
        let content = sample_content();
        let id = insert(&pool, about(), &content, true).await.unwrap();

        let corrupted = json!({
            "badge": "Changed",
            "whoWeAre": "{not json",
            "values": 17,
        });
        store_raw(&pool, id, &corrupted.to_string()).await;

        let record = reload_after_write(&pool, about(), id, &content).await.unwrap();
        assert_eq!(record.content.scalar("badge"), Some(&json!("Changed")));
        assert_eq!(
            record.content.structured_field("whoWeAre"),
            content.structured_field("whoWeAre")
        );
        assert_eq!(record.content.list("values"), content.list("values"));
    }

    #[tokio::test]
    async fn test_unparseable_document_serves_written_content() {
        let pool = test_pool().await;
        let content = sample_content();
        let id = insert(&pool, about(), &content, true).await.unwrap();
        store_raw(&pool, id, "definitely not json").await;

        let record = reload_after_write(&pool, about(), id, &content).await.unwrap();
        assert_eq!(record.content, content);

        let row = find_row(&pool, "about", id).await.unwrap().unwrap();
        assert_eq!(row.decode_for_read(about()).content, SectionContent::empty(about()));
    }

    #[tokio::test]
    async fn test_delete() {
        let pool = test_pool().await;
        let id = insert(&pool, about(), &sample_content(), true).await.unwrap();

        assert!(!delete(&pool, "vmv", id).await.unwrap());
        assert!(delete(&pool, "about", id).await.unwrap());
        assert!(find_row(&pool, "about", id).await.unwrap().is_none());
    }

    #[test]
    fn test_record_json_shape() {
        let now = Utc::now();
        let record = SectionRecord {
            id: Uuid::new_v4(),
            section: "about".into(),
            is_active: true,
            content: sample_content(),
            created_at: now,
            updated_at: now,
        };
        let doc = record.to_json();

        assert_eq!(doc["isActive"], json!(true));
        assert_eq!(doc["badge"], json!("Hero"));
        assert_eq!(doc["whoWeAre"]["image"], json!(""));
        assert!(doc["values"].is_array());
        assert!(doc["createdAt"].is_string());
    }
}
