//! Collection item persistence

use chrono::{DateTime, Utc};
use scms_common::{Error, Result};
use serde_json::{Map, Value};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{parse_guid, parse_timestamp, timestamp_text};
use crate::models::CollectionKind;

#[derive(Debug, Clone, PartialEq)]
pub struct CollectionRow {
    pub id: Uuid,
    pub collection: String,
    pub data: Map<String, Value>,
    pub sort_order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CollectionRow {
    fn from_row(row: &SqliteRow) -> Result<Self> {
        let guid: String = row.get("guid");
        let data: String = row.get("data");
        let created_at: String = row.get("created_at");
        let updated_at: String = row.get("updated_at");

        let data = match serde_json::from_str::<Value>(&data)? {
            Value::Object(map) => map,
            other => {
                return Err(Error::Internal(format!(
                    "collection item {} is not an object: {}",
                    guid, other
                )))
            }
        };

        Ok(Self {
            id: parse_guid(&guid)?,
            collection: row.get("collection"),
            data,
            sort_order: row.get("sort_order"),
            created_at: parse_timestamp(&created_at)?,
            updated_at: parse_timestamp(&updated_at)?,
        })
    }

    /// Response document: the item's fields plus identity and ordering
    pub fn to_json(&self) -> Value {
        let mut map = self.data.clone();
        map.insert("id".to_string(), Value::String(self.id.to_string()));
        map.insert("sortOrder".to_string(), Value::from(self.sort_order));
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

const SELECT_COLUMNS: &str =
    "SELECT guid, collection, data, sort_order, created_at, updated_at FROM collection_items";

/// Items of a collection ordered by `sort_order`, then creation time
///
/// Rows that fail to decode are skipped with a warning.
pub async fn list(pool: &SqlitePool, kind: CollectionKind) -> Result<Vec<CollectionRow>> {
    let rows = sqlx::query(&format!(
        "{} WHERE collection = ? ORDER BY sort_order ASC, created_at ASC",
        SELECT_COLUMNS
    ))
    .bind(kind.slug())
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .filter_map(|row| match CollectionRow::from_row(row) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(collection = kind.slug(), "Skipping unreadable collection item: {}", e);
                None
            }
        })
        .collect())
}

pub async fn get(pool: &SqlitePool, kind: CollectionKind, id: Uuid) -> Result<Option<CollectionRow>> {
    let row = sqlx::query(&format!("{} WHERE collection = ? AND guid = ?", SELECT_COLUMNS))
        .bind(kind.slug())
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(CollectionRow::from_row).transpose()
}

/// Append an item at the end of the collection
pub async fn insert(
    pool: &SqlitePool,
    kind: CollectionKind,
    data: &Map<String, Value>,
) -> Result<CollectionRow> {
    let id = Uuid::new_v4();
    let now = timestamp_text(Utc::now());

    sqlx::query(
        r#"
        INSERT INTO collection_items (guid, collection, data, sort_order, created_at, updated_at)
        VALUES (?, ?, ?,
            (SELECT COALESCE(MAX(sort_order), -1) + 1 FROM collection_items WHERE collection = ?),
            ?, ?)
        "#,
    )
    .bind(id.to_string())
    .bind(kind.slug())
    .bind(serde_json::to_string(data)?)
    .bind(kind.slug())
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    debug!(collection = kind.slug(), %id, "Inserted collection item");

    get(pool, kind, id)
        .await?
        .ok_or_else(|| Error::Internal(format!("collection item {} vanished after insert", id)))
}

/// Replace an item's document; `false` if the item does not exist
pub async fn update(
    pool: &SqlitePool,
    kind: CollectionKind,
    id: Uuid,
    data: &Map<String, Value>,
) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE collection_items SET data = ?, updated_at = ? WHERE collection = ? AND guid = ?",
    )
    .bind(serde_json::to_string(data)?)
    .bind(timestamp_text(Utc::now()))
    .bind(kind.slug())
    .bind(id.to_string())
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &SqlitePool, kind: CollectionKind, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM collection_items WHERE collection = ? AND guid = ?")
        .bind(kind.slug())
        .bind(id.to_string())
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Assign `sort_order` by position in `ids`
///
/// All-or-nothing: an id that is not in the collection aborts the reorder.
/// Items not listed keep their current order values.
pub async fn reorder(pool: &SqlitePool, kind: CollectionKind, ids: &[Uuid]) -> Result<()> {
    let mut tx = pool.begin().await?;

    for (position, id) in ids.iter().enumerate() {
        let result = sqlx::query(
            "UPDATE collection_items SET sort_order = ? WHERE collection = ? AND guid = ?",
        )
        .bind(position as i64)
        .bind(kind.slug())
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(Error::NotFound(format!("{} item {}", kind.slug(), id)));
        }
    }

    tx.commit().await?;
    debug!(collection = kind.slug(), count = ids.len(), "Reordered collection");
    Ok(())
}
