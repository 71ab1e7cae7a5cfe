//! Incoming partial updates
//!
//! A [`RawUpdate`] is what the request boundary extracts from either a JSON
//! body or a multipart form: loose top-level fields plus the public paths of
//! any files that were uploaded. Field groups are decoded once into the
//! tagged unions below and the resolver matches on those.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use super::schema::{StructuredSpec, SubKey};

/// Partial update as received, before resolution
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawUpdate {
    /// Top-level fields (JSON body members or multipart text parts)
    pub fields: Map<String, Value>,
    /// Upload field name → stored public path
    pub uploads: BTreeMap<String, String>,
}

impl RawUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a JSON object body; `None` for any other JSON value
    pub fn from_json(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self {
                fields,
                uploads: BTreeMap::new(),
            }),
            _ => None,
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    pub fn with_upload(mut self, field: impl Into<String>, path: impl Into<String>) -> Self {
        self.uploads.insert(field.into(), path.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.uploads.is_empty()
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// First non-empty upload path stored under any of `names`
    pub fn upload_for<'a, I>(&self, names: I) -> Option<&str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .filter_map(|name| self.uploads.get(name))
            .map(String::as_str)
            .find(|path| !path.is_empty())
    }
}

/// How a structured field arrived in the update
#[derive(Debug, Clone, PartialEq)]
pub enum StructuredInput<'a> {
    /// Nested object
    Object(&'a Map<String, Value>),
    /// JSON-encoded string, not yet parsed
    Serialized(&'a str),
    /// Only flat sibling keys (`whoWeAreBadge`, ...) were sent
    FlatKeys,
    /// Nothing usable was sent
    Absent,
}

impl<'a> StructuredInput<'a> {
    pub fn decode(update: &'a RawUpdate, spec: &StructuredSpec) -> Self {
        match update.field(spec.key) {
            Some(Value::Object(map)) => StructuredInput::Object(map),
            Some(Value::String(text)) if !text.trim().is_empty() => {
                StructuredInput::Serialized(text)
            }
            _ if has_flat_keys(update, spec) => StructuredInput::FlatKeys,
            _ => StructuredInput::Absent,
        }
    }
}

fn has_flat_keys(update: &RawUpdate, spec: &StructuredSpec) -> bool {
    SubKey::ALL
        .iter()
        .any(|sub| update.fields.contains_key(&spec.flat_key(*sub)))
}

/// How a list field arrived in the update
#[derive(Debug, Clone, PartialEq)]
pub enum ListInput<'a> {
    Items(&'a [Value]),
    Serialized(&'a str),
    /// Missing, `null`, or empty string: no value supplied
    Absent,
}

impl<'a> ListInput<'a> {
    pub fn decode(value: Option<&'a Value>) -> Self {
        match value {
            Some(Value::Array(items)) => ListInput::Items(items),
            Some(Value::String(text)) if !text.trim().is_empty() => ListInput::Serialized(text),
            _ => ListInput::Absent,
        }
    }
}

/// Name a JSON value's type for log messages
pub(crate) fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
