//! Canonical section content
//!
//! [`SectionContent`] is the shape every resolved record satisfies: each
//! structured field has all four string sub-keys and each list field is an
//! array of `{title, description}` pairs.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;

use super::schema::{ScalarKind, ScalarSpec, SectionSchema, SubKey};

/// Coerce any JSON value to a string; `null` becomes `""`
///
/// Arrays and objects have no meaningful text form here and also become `""`.
pub fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null | Value::Array(_) | Value::Object(_) => String::new(),
    }
}

/// Nested object with the fixed sub-keys
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredValue {
    pub badge: String,
    pub title: String,
    pub description: String,
    pub image: String,
}

impl StructuredValue {
    pub fn get(&self, sub: SubKey) -> &str {
        match sub {
            SubKey::Badge => &self.badge,
            SubKey::Title => &self.title,
            SubKey::Description => &self.description,
            SubKey::Image => &self.image,
        }
    }

    pub fn set(&mut self, sub: SubKey, value: String) {
        match sub {
            SubKey::Badge => self.badge = value,
            SubKey::Title => self.title = value,
            SubKey::Description => self.description = value,
            SubKey::Image => self.image = value,
        }
    }

    /// Overlay the sub-keys present in `map`
    ///
    /// Text sub-keys take the coerced value (`null` → `""`). The image only
    /// changes for a non-empty string; empty or `null` keeps the current one.
    pub fn overlay(&mut self, map: &Map<String, Value>) {
        for sub in SubKey::ALL {
            let Some(value) = map.get(sub.as_str()) else {
                continue;
            };
            match sub {
                SubKey::Image => {
                    if let Some(url) = non_empty_str(value) {
                        self.image = url.to_string();
                    }
                }
                _ => self.set(sub, coerce_string(value)),
            }
        }
    }

    /// Build from a stored object, missing sub-keys become `""`
    pub fn from_map(map: &Map<String, Value>) -> Self {
        let mut value = Self::default();
        for sub in SubKey::ALL {
            if let Some(v) = map.get(sub.as_str()) {
                value.set(sub, coerce_string(v));
            }
        }
        value
    }

    pub fn to_json(&self) -> Value {
        json!({
            "badge": self.badge,
            "title": self.title,
            "description": self.description,
            "image": self.image,
        })
    }
}

/// One `{title, description}` entry of a list field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListItem {
    pub title: String,
    pub description: String,
}

impl ListItem {
    /// Objects become items; anything else is not a list entry
    pub fn from_value(value: &Value) -> Option<Self> {
        let map = value.as_object()?;
        Some(Self {
            title: map.get("title").map(coerce_string).unwrap_or_default(),
            description: map.get("description").map(coerce_string).unwrap_or_default(),
        })
    }

    pub fn to_json(&self) -> Value {
        json!({
            "title": self.title,
            "description": self.description,
        })
    }
}

/// Collect the object entries of a JSON array into list items
pub fn list_from_values(values: &[Value]) -> Vec<ListItem> {
    values.iter().filter_map(ListItem::from_value).collect()
}

/// Content of one section record, minus identity and timestamps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionContent {
    pub scalars: BTreeMap<String, Value>,
    pub structured: BTreeMap<String, StructuredValue>,
    pub lists: BTreeMap<String, Vec<ListItem>>,
}

/// A stored field that could not be decoded into its canonical shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFieldError {
    pub field: String,
    pub reason: String,
}

impl fmt::Display for StoredFieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "stored field '{}' is unreadable: {}", self.field, self.reason)
    }
}

impl std::error::Error for StoredFieldError {}

fn non_empty_str(value: &Value) -> Option<&str> {
    value.as_str().filter(|s| !s.is_empty())
}

/// Default value of a scalar when no record exists
pub fn scalar_default(spec: &ScalarSpec) -> Value {
    match spec.kind {
        ScalarKind::Text | ScalarKind::Image { .. } => Value::String(String::new()),
        ScalarKind::Flag => Value::Bool(false),
    }
}

/// Coerce a stored scalar into its kind, `None` when it cannot be
pub fn coerce_scalar(kind: ScalarKind, value: &Value) -> Option<Value> {
    match kind {
        ScalarKind::Text | ScalarKind::Image { .. } => match value {
            Value::Array(_) | Value::Object(_) => None,
            other => Some(Value::String(coerce_string(other))),
        },
        ScalarKind::Flag => match value {
            Value::Bool(b) => Some(Value::Bool(*b)),
            Value::Number(n) => Some(Value::Bool(n.as_f64().map(|f| f != 0.0).unwrap_or(false))),
            Value::String(s) => parse_flag(s).map(Value::Bool),
            _ => None,
        },
    }
}

/// Parse the textual booleans browsers and admin forms send
pub fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" | "" => Some(false),
        _ => None,
    }
}

/// Decode a stored structured field, re-parsing string-serialized objects
fn stored_structured(value: Option<&Value>) -> Result<StructuredValue, String> {
    match value {
        None | Some(Value::Null) => Ok(StructuredValue::default()),
        Some(Value::Object(map)) => Ok(StructuredValue::from_map(map)),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Object(map)) => Ok(StructuredValue::from_map(&map)),
            Ok(_) => Err("serialized value is not an object".to_string()),
            Err(e) => Err(e.to_string()),
        },
        Some(_) => Err("value is not an object".to_string()),
    }
}

/// Decode a stored list field, re-parsing string-serialized arrays
fn stored_list(value: Option<&Value>) -> Result<Vec<ListItem>, String> {
    match value {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::Array(items)) => Ok(list_from_values(items)),
        Some(Value::String(text)) => match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) => Ok(list_from_values(&items)),
            Ok(_) => Err("serialized value is not an array".to_string()),
            Err(e) => Err(e.to_string()),
        },
        Some(_) => Err("value is not an array".to_string()),
    }
}

impl SectionContent {
    /// Type-correct empty content for a section
    pub fn empty(schema: &SectionSchema) -> Self {
        let mut content = Self::default();
        for spec in schema.scalars {
            content.scalars.insert(spec.key.to_string(), scalar_default(spec));
        }
        for spec in schema.structured {
            content
                .structured
                .insert(spec.key.to_string(), StructuredValue::default());
        }
        for spec in schema.lists {
            content.lists.insert(spec.key.to_string(), Vec::new());
        }
        content
    }

    /// Restrict to the schema's fields, filling any missing one with its default
    pub fn conformed(&self, schema: &SectionSchema) -> Self {
        let mut content = Self::empty(schema);
        for spec in schema.scalars {
            if let Some(value) = self.scalars.get(spec.key).and_then(|v| coerce_scalar(spec.kind, v)) {
                content.scalars.insert(spec.key.to_string(), value);
            }
        }
        for spec in schema.structured {
            if let Some(value) = self.structured.get(spec.key) {
                content.structured.insert(spec.key.to_string(), value.clone());
            }
        }
        for spec in schema.lists {
            if let Some(items) = self.lists.get(spec.key) {
                content.lists.insert(spec.key.to_string(), items.clone());
            }
        }
        content
    }

    pub fn scalar(&self, key: &str) -> Option<&Value> {
        self.scalars.get(key)
    }

    pub fn structured_field(&self, key: &str) -> Option<&StructuredValue> {
        self.structured.get(key)
    }

    pub fn list(&self, key: &str) -> Option<&[ListItem]> {
        self.lists.get(key).map(Vec::as_slice)
    }

    /// Decode a stored document strictly
    ///
    /// Nested fields that the storage layer re-serialized as strings are
    /// re-parsed; the first field that still cannot be decoded is an error.
    pub fn from_stored(schema: &SectionSchema, stored: &Value) -> Result<Self, StoredFieldError> {
        let empty = Map::new();
        let doc = match stored {
            Value::Object(map) => map,
            Value::Null => &empty,
            _ => {
                return Err(StoredFieldError {
                    field: schema.name.to_string(),
                    reason: "document is not an object".to_string(),
                })
            }
        };

        let mut content = Self::empty(schema);
        for spec in schema.scalars {
            if let Some(value) = doc.get(spec.key).and_then(|v| coerce_scalar(spec.kind, v)) {
                content.scalars.insert(spec.key.to_string(), value);
            }
        }
        for spec in schema.structured {
            let value = stored_structured(doc.get(spec.key)).map_err(|reason| StoredFieldError {
                field: spec.key.to_string(),
                reason,
            })?;
            content.structured.insert(spec.key.to_string(), value);
        }
        for spec in schema.lists {
            let items = stored_list(doc.get(spec.key)).map_err(|reason| StoredFieldError {
                field: spec.key.to_string(),
                reason,
            })?;
            content.lists.insert(spec.key.to_string(), items);
        }
        Ok(content)
    }

    /// Decode a stored document field by field
    ///
    /// Any nested field that cannot be decoded takes its value from
    /// `fallback`; the names of those fields are returned alongside.
    pub fn from_stored_lenient(
        schema: &SectionSchema,
        stored: &Value,
        fallback: &SectionContent,
    ) -> (Self, Vec<StoredFieldError>) {
        let empty = Map::new();
        let doc = stored.as_object().unwrap_or(&empty);
        let fallback = fallback.conformed(schema);
        let mut content = Self::empty(schema);
        let mut failures = Vec::new();

        for spec in schema.scalars {
            let value = doc
                .get(spec.key)
                .and_then(|v| coerce_scalar(spec.kind, v))
                .or_else(|| fallback.scalars.get(spec.key).cloned())
                .unwrap_or_else(|| scalar_default(spec));
            content.scalars.insert(spec.key.to_string(), value);
        }
        for spec in schema.structured {
            let value = match stored_structured(doc.get(spec.key)) {
                Ok(value) => value,
                Err(reason) => {
                    failures.push(StoredFieldError {
                        field: spec.key.to_string(),
                        reason,
                    });
                    fallback.structured.get(spec.key).cloned().unwrap_or_default()
                }
            };
            content.structured.insert(spec.key.to_string(), value);
        }
        for spec in schema.lists {
            let items = match stored_list(doc.get(spec.key)) {
                Ok(items) => items,
                Err(reason) => {
                    failures.push(StoredFieldError {
                        field: spec.key.to_string(),
                        reason,
                    });
                    fallback.lists.get(spec.key).cloned().unwrap_or_default()
                }
            };
            content.lists.insert(spec.key.to_string(), items);
        }
        (content, failures)
    }

    /// Flat JSON document: scalars, structured fields and lists side by side
    pub fn to_json_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for (key, value) in &self.scalars {
            map.insert(key.clone(), value.clone());
        }
        for (key, value) in &self.structured {
            map.insert(key.clone(), value.to_json());
        }
        for (key, items) in &self.lists {
            map.insert(
                key.clone(),
                Value::Array(items.iter().map(ListItem::to_json).collect()),
            );
        }
        map
    }
}
