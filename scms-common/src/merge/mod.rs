//! Partial-merge upsert resolver for singleton content sections
//!
//! A section update can arrive as a JSON body or as multipart form fields
//! with uploaded files, and may carry only a subset of the section's fields.
//! [`resolve`] merges it into the current record (if any) and always yields
//! canonical [`SectionContent`]:
//!
//! - fields absent from the update keep their stored value
//! - structured fields always carry `badge`, `title`, `description`, `image`
//! - list fields are always arrays
//! - malformed JSON degrades to the stored value with a logged warning
//!
//! The resolver is pure apart from logging; persistence belongs to the caller.

pub mod content;
pub mod input;
pub mod resolve;
pub mod schema;

pub use content::{ListItem, SectionContent, StoredFieldError, StructuredValue};
pub use input::{ListInput, RawUpdate, StructuredInput};
pub use resolve::{resolve, MergeWarning, Outcome, Resolution};
pub use schema::{ListSpec, ScalarKind, ScalarSpec, SectionSchema, StructuredSpec, SubKey};
