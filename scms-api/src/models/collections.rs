//! Collection item models
//!
//! Unlike singleton sections, collections hold many independent items with
//! ordinary CRUD semantics. Each kind has a typed model; a submitted document
//! is deserialized through it, validated, and serialized back, so stored
//! documents only ever carry known fields in their canonical types.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{Map, Value};

use super::lenient::{default_true, flag, opt_u8, text};
use scms_common::RawUpdate;

/// Upload field names that set an item's `image`
pub const IMAGE_UPLOAD_FIELDS: [&str; 2] = ["image", "file"];

/// The collections served under `/api/collections/:collection`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    Testimonials,
    Staff,
    Press,
    ImpactStats,
    SocialPosts,
}

impl CollectionKind {
    pub const ALL: [CollectionKind; 5] = [
        CollectionKind::Testimonials,
        CollectionKind::Staff,
        CollectionKind::Press,
        CollectionKind::ImpactStats,
        CollectionKind::SocialPosts,
    ];

    pub fn from_slug(slug: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.slug() == slug)
    }

    /// URL segment and `collection` column value
    pub fn slug(self) -> &'static str {
        match self {
            CollectionKind::Testimonials => "testimonials",
            CollectionKind::Staff => "staff",
            CollectionKind::Press => "press",
            CollectionKind::ImpactStats => "impact-stats",
            CollectionKind::SocialPosts => "social-posts",
        }
    }

    /// Validate a complete document and return its canonical form
    pub fn canonicalize(self, doc: Map<String, Value>) -> Result<Map<String, Value>, String> {
        match self {
            CollectionKind::Testimonials => canonical::<Testimonial>(doc),
            CollectionKind::Staff => canonical::<StaffMember>(doc),
            CollectionKind::Press => canonical::<PressArticle>(doc),
            CollectionKind::ImpactStats => canonical::<ImpactStat>(doc),
            CollectionKind::SocialPosts => canonical::<SocialPost>(doc),
        }
    }
}

/// Typed collection item
pub trait CollectionItem: Serialize + DeserializeOwned {
    /// Check required fields and value ranges
    fn validate(&self) -> Result<(), String>;
}

fn canonical<T: CollectionItem>(doc: Map<String, Value>) -> Result<Map<String, Value>, String> {
    let item: T = serde_json::from_value(Value::Object(doc)).map_err(|e| e.to_string())?;
    item.validate()?;
    match serde_json::to_value(&item).map_err(|e| e.to_string())? {
        Value::Object(map) => Ok(map),
        other => Err(format!("item serialized to a non-object: {}", other)),
    }
}

fn require(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("'{}' is required", field))
    } else {
        Ok(())
    }
}

/// Overlay an update onto a document: present top-level keys replace stored
/// ones, and an uploaded image wins over any `image` text field
pub fn apply_update(mut doc: Map<String, Value>, update: &RawUpdate) -> Map<String, Value> {
    for (key, value) in &update.fields {
        doc.insert(key.clone(), value.clone());
    }
    if let Some(path) = update.upload_for(IMAGE_UPLOAD_FIELDS) {
        doc.insert("image".to_string(), Value::String(path.to_string()));
    }
    doc
}

/// Whether a stored document is marked active (missing counts as active)
pub fn is_active(doc: &Map<String, Value>) -> bool {
    doc.get("isActive").and_then(Value::as_bool).unwrap_or(true)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    #[serde(default, deserialize_with = "text")]
    pub quote: String,
    #[serde(default, deserialize_with = "text")]
    pub author: String,
    #[serde(default, deserialize_with = "text")]
    pub role: String,
    #[serde(default, deserialize_with = "text")]
    pub organization: String,
    #[serde(default, deserialize_with = "text")]
    pub image: String,
    #[serde(default, deserialize_with = "opt_u8")]
    pub rating: Option<u8>,
    #[serde(default = "default_true", deserialize_with = "flag")]
    pub is_active: bool,
}

impl CollectionItem for Testimonial {
    fn validate(&self) -> Result<(), String> {
        require("quote", &self.quote)?;
        require("author", &self.author)?;
        if let Some(rating) = self.rating {
            if !(1..=5).contains(&rating) {
                return Err(format!("'rating' must be between 1 and 5, got {}", rating));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffMember {
    #[serde(default, deserialize_with = "text")]
    pub name: String,
    #[serde(default, deserialize_with = "text")]
    pub position: String,
    #[serde(default, deserialize_with = "text")]
    pub bio: String,
    #[serde(default, deserialize_with = "text")]
    pub image: String,
    #[serde(default, deserialize_with = "text")]
    pub email: String,
    #[serde(default, deserialize_with = "text")]
    pub linkedin_url: String,
    #[serde(default = "default_true", deserialize_with = "flag")]
    pub is_active: bool,
}

impl CollectionItem for StaffMember {
    fn validate(&self) -> Result<(), String> {
        require("name", &self.name)?;
        if !self.email.is_empty() && !self.email.contains('@') {
            return Err(format!("'email' is not an address: {}", self.email));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PressArticle {
    #[serde(default, deserialize_with = "text")]
    pub title: String,
    #[serde(default, deserialize_with = "text")]
    pub publication: String,
    #[serde(default, deserialize_with = "text")]
    pub url: String,
    #[serde(default, deserialize_with = "text")]
    pub excerpt: String,
    #[serde(default, deserialize_with = "text")]
    pub image: String,
    #[serde(default, deserialize_with = "text")]
    pub published_at: String,
    #[serde(default = "default_true", deserialize_with = "flag")]
    pub is_active: bool,
}

impl CollectionItem for PressArticle {
    fn validate(&self) -> Result<(), String> {
        require("title", &self.title)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactStat {
    #[serde(default, deserialize_with = "text")]
    pub label: String,
    /// Display value, e.g. `"500"` or `"1.2k"`
    #[serde(default, deserialize_with = "text")]
    pub value: String,
    #[serde(default, deserialize_with = "text")]
    pub suffix: String,
    #[serde(default, deserialize_with = "text")]
    pub icon: String,
    #[serde(default = "default_true", deserialize_with = "flag")]
    pub is_active: bool,
}

impl CollectionItem for ImpactStat {
    fn validate(&self) -> Result<(), String> {
        require("label", &self.label)?;
        require("value", &self.value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialPost {
    #[serde(default, deserialize_with = "text")]
    pub platform: String,
    #[serde(default, deserialize_with = "text")]
    pub url: String,
    #[serde(default, deserialize_with = "text")]
    pub caption: String,
    #[serde(default, deserialize_with = "text")]
    pub image: String,
    #[serde(default, deserialize_with = "text")]
    pub posted_at: String,
    #[serde(default = "default_true", deserialize_with = "flag")]
    pub is_active: bool,
}

impl CollectionItem for SocialPost {
    fn validate(&self) -> Result<(), String> {
        require("platform", &self.platform)?;
        require("url", &self.url)
    }
}
