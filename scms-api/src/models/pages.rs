//! Dynamic page models
//!
//! A dynamic page is addressed by slug and composed of typed content blocks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use scms_common::merge::content::{coerce_string, parse_flag};
use scms_common::RawUpdate;

const MAX_SLUG_LEN: usize = 100;

/// One block of page content, tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text {
        #[serde(default)]
        heading: String,
        #[serde(default)]
        body: String,
    },
    Image {
        #[serde(default)]
        url: String,
        #[serde(default)]
        alt: String,
        #[serde(default)]
        caption: String,
    },
    Cards {
        #[serde(default)]
        heading: String,
        #[serde(default)]
        cards: Vec<Card>,
    },
    Stats {
        #[serde(default)]
        heading: String,
        #[serde(default)]
        stats: Vec<StatEntry>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Card {
    pub title: String,
    pub description: String,
    pub image: String,
    pub link: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatEntry {
    pub label: String,
    pub value: String,
}

/// Stored dynamic page
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicPage {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub blocks: Vec<ContentBlock>,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Page fields to be written, before identity and timestamps are assigned
#[derive(Debug, Clone, PartialEq)]
pub struct PageDraft {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub blocks: Vec<ContentBlock>,
    pub is_published: bool,
}

impl PageDraft {
    /// Draft for a new page; `slug` and `title` are required
    pub fn create(update: &RawUpdate) -> Result<Self, String> {
        let slug = text_field(update, "slug").unwrap_or_default();
        let title = text_field(update, "title").unwrap_or_default();
        if title.trim().is_empty() {
            return Err("'title' is required".to_string());
        }
        validate_slug(&slug)?;

        Ok(Self {
            slug,
            title,
            description: text_field(update, "description").unwrap_or_default(),
            blocks: match update.field("blocks") {
                Some(value) => parse_blocks(value)?,
                None => Vec::new(),
            },
            is_published: flag_field(update, "isPublished")?.unwrap_or(false),
        })
    }

    /// Draft for an existing page: fields absent from the update are kept
    pub fn merge(existing: &DynamicPage, update: &RawUpdate) -> Result<Self, String> {
        let slug = text_field(update, "slug").unwrap_or_else(|| existing.slug.clone());
        validate_slug(&slug)?;

        let title = text_field(update, "title").unwrap_or_else(|| existing.title.clone());
        if title.trim().is_empty() {
            return Err("'title' must not be empty".to_string());
        }

        Ok(Self {
            slug,
            title,
            description: text_field(update, "description")
                .unwrap_or_else(|| existing.description.clone()),
            blocks: match update.field("blocks") {
                Some(Value::Null) | None => existing.blocks.clone(),
                Some(value) => parse_blocks(value)?,
            },
            is_published: flag_field(update, "isPublished")?.unwrap_or(existing.is_published),
        })
    }
}

fn text_field(update: &RawUpdate, key: &str) -> Option<String> {
    match update.field(key) {
        None | Some(Value::Null) => None,
        Some(value) => Some(coerce_string(value)),
    }
}

fn flag_field(update: &RawUpdate, key: &str) -> Result<Option<bool>, String> {
    match update.field(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(Value::String(s)) => parse_flag(s)
            .map(Some)
            .ok_or_else(|| format!("'{}' must be a boolean, got '{}'", key, s)),
        Some(other) => Err(format!("'{}' must be a boolean, got {}", key, other)),
    }
}

/// Decode the `blocks` field from an array or a JSON-encoded string
///
/// Unlike section lists, blocks are not recovered from bad input: an unknown
/// block type or malformed JSON is a client error.
pub fn parse_blocks(value: &Value) -> Result<Vec<ContentBlock>, String> {
    let parsed;
    let value = match value {
        Value::String(text) if text.trim().is_empty() => return Ok(Vec::new()),
        Value::String(text) => {
            parsed = serde_json::from_str::<Value>(text)
                .map_err(|e| format!("'blocks' is not valid JSON: {}", e))?;
            &parsed
        }
        other => other,
    };

    if !value.is_array() {
        return Err("'blocks' must be an array".to_string());
    }
    serde_json::from_value(value.clone()).map_err(|e| format!("invalid block: {}", e))
}

/// Slugs are lowercase ASCII alphanumerics separated by single hyphens
pub fn validate_slug(slug: &str) -> Result<(), String> {
    let well_formed = !slug.is_empty()
        && slug.len() <= MAX_SLUG_LEN
        && !slug.starts_with('-')
        && !slug.ends_with('-')
        && !slug.contains("--")
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

    if well_formed {
        Ok(())
    } else {
        Err(format!(
            "invalid slug '{}': use lowercase letters, digits and single hyphens",
            slug
        ))
    }
}
