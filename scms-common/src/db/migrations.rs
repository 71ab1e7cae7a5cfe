//! Database schema migrations
//!
//! Versioned, idempotent migrations tracked in the `schema_version` table.
//!
//! # Migration Guidelines
//!
//! 1. Never modify an existing migration
//! 2. Add a new migration function for each schema or data change
//! 3. Every migration must be safe to run twice

use crate::merge::{SectionContent, SectionSchema};
use crate::Result;
use sqlx::{Row, SqlitePool};
use tracing::{info, warn};

/// Current schema version
///
/// Increment when adding a migration.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Latest applied schema version, 0 for a fresh database
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    if current_version < 2 {
        migrate_v2(pool).await?;
        set_schema_version(pool, 2).await?;
        info!("✓ Migration v2 completed");
    }

    Ok(())
}

/// Migration v1: baseline schema
///
/// Tables are created by `create_schema`; this only records the baseline.
async fn migrate_v1(_pool: &SqlitePool) -> Result<()> {
    info!("Migration v1: baseline content schema");
    Ok(())
}

/// Migration v2: rewrite section documents whose nested fields were stored
/// as JSON strings
///
/// Rows that cannot be decoded even after re-parsing are left untouched so
/// no content is lost; the API re-parses them on every read.
async fn migrate_v2(pool: &SqlitePool) -> Result<()> {
    let rows = sqlx::query("SELECT guid, section, data FROM section_records")
        .fetch_all(pool)
        .await?;

    let mut repaired = 0;
    for row in rows {
        let guid: String = row.get("guid");
        let section: String = row.get("section");
        let data: String = row.get("data");

        let Some(schema) = SectionSchema::lookup(&section) else {
            warn!("Migration v2: skipping record {} of unknown section '{}'", guid, section);
            continue;
        };
        let Ok(stored) = serde_json::from_str::<serde_json::Value>(&data) else {
            warn!("Migration v2: record {} holds invalid JSON, left as is", guid);
            continue;
        };

        match SectionContent::from_stored(schema, &stored) {
            Ok(content) => {
                let canonical = serde_json::Value::Object(content.to_json_map());
                if canonical != stored {
                    sqlx::query("UPDATE section_records SET data = ? WHERE guid = ?")
                        .bind(canonical.to_string())
                        .bind(&guid)
                        .execute(pool)
                        .await?;
                    repaired += 1;
                }
            }
            Err(e) => {
                warn!("Migration v2: record {} left as is: {}", guid, e);
            }
        }
    }

    info!("Migration v2: normalized {} section record(s)", repaired);
    Ok(())
}
