//! Database access for scms-api
//!
//! Tables are created by `scms_common::db::init_database`; these modules hold
//! the queries. Timestamps are stored as RFC 3339 text with fixed precision so
//! that they also sort correctly as strings.

pub mod collections;
pub mod pages;
pub mod sections;

use chrono::{DateTime, SecondsFormat, Utc};
use scms_common::{Error, Result};
use uuid::Uuid;

pub(crate) fn timestamp_text(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("invalid stored timestamp '{}': {}", text, e)))
}

pub(crate) fn parse_guid(text: &str) -> Result<Uuid> {
    Uuid::parse_str(text)
        .map_err(|e| Error::Internal(format!("invalid stored guid '{}': {}", text, e)))
}

#[cfg(test)]
pub(crate) async fn test_pool() -> sqlx::SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    scms_common::db::create_schema(&pool).await.unwrap();
    pool
}
