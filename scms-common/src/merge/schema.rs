//! Section schemas
//!
//! Each singleton section is described declaratively: which scalar fields it
//! carries, which structured fields (fixed `badge`/`title`/`description`/
//! `image` sub-keys) and which `{title, description}` list fields.

/// Fixed sub-keys of every structured field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubKey {
    Badge,
    Title,
    Description,
    Image,
}

impl SubKey {
    pub const ALL: [SubKey; 4] = [SubKey::Badge, SubKey::Title, SubKey::Description, SubKey::Image];

    /// Key inside the nested object
    pub fn as_str(self) -> &'static str {
        match self {
            SubKey::Badge => "badge",
            SubKey::Title => "title",
            SubKey::Description => "description",
            SubKey::Image => "image",
        }
    }

    /// Suffix appended to the field prefix in the flat multipart encoding
    fn flat_suffix(self) -> &'static str {
        match self {
            SubKey::Badge => "Badge",
            SubKey::Title => "Title",
            SubKey::Description => "Description",
            SubKey::Image => "Image",
        }
    }
}

/// How a scalar field is coerced and merged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    /// Free text; numbers and booleans are stringified
    Text,
    /// Boolean; multipart strings such as "true"/"on"/"1" are accepted
    Flag,
    /// Image path or URL; an uploaded file under one of the aliases wins
    Image {
        upload_aliases: &'static [&'static str],
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarSpec {
    pub key: &'static str,
    pub kind: ScalarKind,
}

impl ScalarSpec {
    const fn text(key: &'static str) -> Self {
        Self {
            key,
            kind: ScalarKind::Text,
        }
    }

    const fn flag(key: &'static str) -> Self {
        Self {
            key,
            kind: ScalarKind::Flag,
        }
    }

    const fn image(key: &'static str, upload_aliases: &'static [&'static str]) -> Self {
        Self {
            key,
            kind: ScalarKind::Image { upload_aliases },
        }
    }
}

/// Structured field description
///
/// `key` doubles as the prefix of the flat sibling keys, so `whoWeAre` is
/// also accepted as `whoWeAreBadge`, `whoWeAreTitle`, and so on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructuredSpec {
    pub key: &'static str,
    /// Upload field names whose file becomes the nested `image`
    pub upload_aliases: &'static [&'static str],
}

impl StructuredSpec {
    /// Flat sibling key for one sub-key, e.g. `whoWeAreTitle`
    pub fn flat_key(&self, sub: SubKey) -> String {
        format!("{}{}", self.key, sub.flat_suffix())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListSpec {
    pub key: &'static str,
}

/// Schema of one singleton section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSchema {
    /// URL name of the section
    pub name: &'static str,
    /// Human-readable name used in logs
    pub label: &'static str,
    pub scalars: &'static [ScalarSpec],
    pub structured: &'static [StructuredSpec],
    pub lists: &'static [ListSpec],
}

const ABOUT: SectionSchema = SectionSchema {
    name: "about",
    label: "About STEM Center",
    scalars: &[
        ScalarSpec::text("badge"),
        ScalarSpec::text("title"),
        ScalarSpec::text("description"),
        ScalarSpec::text("statistic"),
        ScalarSpec::text("mission"),
        ScalarSpec::text("vision"),
    ],
    structured: &[StructuredSpec {
        key: "whoWeAre",
        upload_aliases: &["whoWeAreImage", "whoWeAreImageFile"],
    }],
    lists: &[ListSpec { key: "values" }],
};

const VMV: SectionSchema = SectionSchema {
    name: "vmv",
    label: "Vision, Mission and Values",
    scalars: &[
        ScalarSpec::text("badge"),
        ScalarSpec::text("title"),
        ScalarSpec::text("description"),
        ScalarSpec::text("mission"),
        ScalarSpec::text("vision"),
    ],
    structured: &[],
    lists: &[ListSpec { key: "values" }],
};

const FOOTER: SectionSchema = SectionSchema {
    name: "footer",
    label: "Footer",
    scalars: &[
        ScalarSpec::text("organizationName"),
        ScalarSpec::text("tagline"),
        ScalarSpec::text("email"),
        ScalarSpec::text("phone"),
        ScalarSpec::text("address"),
        ScalarSpec::text("copyright"),
        ScalarSpec::text("facebookUrl"),
        ScalarSpec::text("twitterUrl"),
        ScalarSpec::text("instagramUrl"),
        ScalarSpec::text("linkedinUrl"),
        ScalarSpec::flag("showNewsletter"),
    ],
    structured: &[],
    lists: &[ListSpec { key: "programs" }],
};

const HERO: SectionSchema = SectionSchema {
    name: "hero",
    label: "Hero",
    scalars: &[
        ScalarSpec::text("badge"),
        ScalarSpec::text("title"),
        ScalarSpec::text("subtitle"),
        ScalarSpec::text("buttonText"),
        ScalarSpec::text("buttonLink"),
        ScalarSpec::image("image", &["file", "heroImage"]),
    ],
    structured: &[StructuredSpec {
        key: "heroData",
        upload_aliases: &["heroDataImage", "heroDataImageFile"],
    }],
    lists: &[],
};

static SECTIONS: [SectionSchema; 4] = [ABOUT, VMV, FOOTER, HERO];

impl SectionSchema {
    /// All built-in singleton sections
    pub fn all() -> &'static [SectionSchema] {
        &SECTIONS
    }

    /// Find a built-in section by its URL name
    pub fn lookup(name: &str) -> Option<&'static SectionSchema> {
        SECTIONS.iter().find(|schema| schema.name == name)
    }

    /// Every top-level key this section understands
    pub fn field_names(&self) -> Vec<&'static str> {
        self.scalars
            .iter()
            .map(|s| s.key)
            .chain(self.structured.iter().map(|s| s.key))
            .chain(self.lists.iter().map(|l| l.key))
            .collect()
    }
}
