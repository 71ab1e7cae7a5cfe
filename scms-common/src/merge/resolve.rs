//! Partial-merge upsert resolution
//!
//! Every field group is resolved independently:
//!
//! 1. nested object → base (merged over the existing sub-keys)
//! 2. JSON string → parsed base, or the existing value if it does not parse
//! 3. flat sibling keys → existing value, overridden below
//! 4. nothing → existing value, or the empty default
//!
//! then flat sibling keys override single sub-keys, and image precedence is
//! uploaded file > URL string in the update > existing value.

use serde_json::Value;
use std::fmt;
use tracing::{debug, warn};

use super::content::{
    coerce_scalar, coerce_string, list_from_values, ListItem, SectionContent, StructuredValue,
};
use super::input::{shape_name, ListInput, RawUpdate, StructuredInput};
use super::schema::{ListSpec, ScalarKind, ScalarSpec, SectionSchema, StructuredSpec, SubKey};

/// Whether the resolution creates a record or merges into one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Create,
    MergeAndUpdate,
}

/// A recovered problem with one field of the update
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeWarning {
    /// The field held a JSON string that did not parse
    MalformedJson { field: String, error: String },
    /// The field had a type the section cannot use
    WrongShape { field: String, found: &'static str },
}

impl fmt::Display for MergeWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeWarning::MalformedJson { field, error } => {
                write!(f, "field '{}' is not valid JSON ({}), kept existing value", field, error)
            }
            MergeWarning::WrongShape { field, found } => {
                write!(f, "field '{}' has unexpected {} value, kept existing value", field, found)
            }
        }
    }
}

/// Result of resolving one update
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub outcome: Outcome,
    pub content: SectionContent,
    pub warnings: Vec<MergeWarning>,
}

/// Merge `update` into `existing` for the given section
///
/// Never fails: unusable input degrades to the existing value and is
/// reported in [`Resolution::warnings`] and the log.
pub fn resolve(
    schema: &SectionSchema,
    existing: Option<&SectionContent>,
    update: &RawUpdate,
) -> Resolution {
    let outcome = if existing.is_some() {
        Outcome::MergeAndUpdate
    } else {
        Outcome::Create
    };
    let prior = existing
        .map(|content| content.conformed(schema))
        .unwrap_or_else(|| SectionContent::empty(schema));

    let mut resolver = Resolver {
        schema,
        update,
        warnings: Vec::new(),
    };
    let mut content = SectionContent::empty(schema);

    for spec in schema.scalars {
        let prior_value = prior.scalars.get(spec.key).cloned().unwrap_or(Value::Null);
        let value = resolver.scalar(spec, prior_value);
        content.scalars.insert(spec.key.to_string(), value);
    }
    for spec in schema.structured {
        let prior_value = prior.structured.get(spec.key).cloned().unwrap_or_default();
        let value = resolver.structured(spec, prior_value);
        content.structured.insert(spec.key.to_string(), value);
    }
    for spec in schema.lists {
        let prior_items = prior.lists.get(spec.key).cloned().unwrap_or_default();
        let items = resolver.list(spec, prior_items);
        content.lists.insert(spec.key.to_string(), items);
    }

    debug!(
        section = schema.name,
        ?outcome,
        fields = update.fields.len(),
        uploads = update.uploads.len(),
        "Resolved section update"
    );

    Resolution {
        outcome,
        content,
        warnings: resolver.warnings,
    }
}

struct Resolver<'a> {
    schema: &'a SectionSchema,
    update: &'a RawUpdate,
    warnings: Vec<MergeWarning>,
}

impl Resolver<'_> {
    fn record(&mut self, warning: MergeWarning) {
        warn!("{}: {}", self.schema.label, warning);
        self.warnings.push(warning);
    }

    fn wrong_shape(&mut self, field: &str, value: &Value) {
        self.record(MergeWarning::WrongShape {
            field: field.to_string(),
            found: shape_name(value),
        });
    }

    fn scalar(&mut self, spec: &ScalarSpec, prior: Value) -> Value {
        let update = self.update;
        if let ScalarKind::Image { upload_aliases } = spec.kind {
            let names = std::iter::once(spec.key).chain(upload_aliases.iter().copied());
            if let Some(path) = update.upload_for(names) {
                return Value::String(path.to_string());
            }
        }

        let Some(incoming) = update.field(spec.key) else {
            return prior;
        };

        match (spec.kind, incoming) {
            (_, Value::Null) => prior,
            (ScalarKind::Image { .. }, Value::String(url)) if url.is_empty() => prior,
            (kind, value) => match coerce_scalar(kind, value) {
                Some(coerced) => coerced,
                None => {
                    self.wrong_shape(spec.key, value);
                    prior
                }
            },
        }
    }

    fn structured(&mut self, spec: &StructuredSpec, prior: StructuredValue) -> StructuredValue {
        let update = self.update;
        let mut value = match StructuredInput::decode(update, spec) {
            StructuredInput::Object(map) => {
                let mut value = prior;
                value.overlay(map);
                value
            }
            StructuredInput::Serialized(text) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Object(map)) => {
                    let mut value = prior;
                    value.overlay(&map);
                    value
                }
                Ok(other) => {
                    self.wrong_shape(spec.key, &other);
                    prior
                }
                Err(e) => {
                    self.record(MergeWarning::MalformedJson {
                        field: spec.key.to_string(),
                        error: e.to_string(),
                    });
                    prior
                }
            },
            StructuredInput::FlatKeys | StructuredInput::Absent => {
                if let Some(other) = update.field(spec.key) {
                    if !is_blank(other) {
                        self.wrong_shape(spec.key, other);
                    }
                }
                prior
            }
        };

        // Flat sibling keys override single sub-keys
        for sub in [SubKey::Badge, SubKey::Title, SubKey::Description] {
            match update.field(&spec.flat_key(sub)) {
                None | Some(Value::Null) => {}
                Some(v) => value.set(sub, coerce_string(v)),
            }
        }

        // Image: upload > URL string > existing
        let image_key = spec.flat_key(SubKey::Image);
        let upload_names = std::iter::once(image_key.as_str()).chain(spec.upload_aliases.iter().copied());
        if let Some(path) = update.upload_for(upload_names) {
            value.image = path.to_string();
        } else if let Some(url) = update
            .field(&image_key)
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty())
        {
            value.image = url.to_string();
        }

        value
    }

    fn list(&mut self, spec: &ListSpec, prior: Vec<ListItem>) -> Vec<ListItem> {
        let update = self.update;
        match ListInput::decode(update.field(spec.key)) {
            ListInput::Items(values) => list_from_values(values),
            ListInput::Serialized(text) => match serde_json::from_str::<Value>(text) {
                Ok(Value::Array(values)) => list_from_values(&values),
                Ok(other) => {
                    self.wrong_shape(spec.key, &other);
                    prior
                }
                Err(e) => {
                    self.record(MergeWarning::MalformedJson {
                        field: spec.key.to_string(),
                        error: e.to_string(),
                    });
                    prior
                }
            },
            ListInput::Absent => {
                if let Some(other) = update.field(spec.key) {
                    if !is_blank(other) {
                        self.wrong_shape(spec.key, other);
                    }
                }
                prior
            }
        }
    }
}

/// `null` or a whitespace-only string: the caller sent no value
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}
