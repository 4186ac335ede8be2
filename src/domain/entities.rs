//! Catalog entities as returned by the content backend
//!
//! The browsing layer does not own these schemas; it only reads the handful
//! of fields exposed through [`CatalogEntity`] for local search and list keys.
//! Field names follow the CMS document shape (`_id`, `_createdAt`,
//! `slug.current`, dereferenced `brand->{name, _id}`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::domain::criteria::SearchQuery;

/// Document kinds the storefront browses or filters by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum EntityKind {
    Product,
    Brand,
    Blog,
    Department,
}

impl EntityKind {
    /// The `_type` value of this kind in the content backend.
    pub const fn document_type(self) -> &'static str {
        match self {
            Self::Product => "product",
            Self::Brand => "brand",
            Self::Blog => "blog",
            Self::Department => "department",
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.document_type())
    }
}

/// Read-only view of an entity used by the generic browser.
///
/// `display_name` and `secondary_labels` are the fields scanned by the
/// short-query local search.
pub trait CatalogEntity: Clone + Send + Sync + 'static {
    const KIND: EntityKind;

    fn id(&self) -> &str;

    fn display_name(&self) -> &str;

    fn secondary_labels(&self) -> Vec<&str>;

    fn slug(&self) -> Option<&str> {
        None
    }

    /// Case-insensitive substring match over the display name and labels.
    fn matches(&self, query: &SearchQuery) -> bool {
        query.matches(self.display_name())
            || self
                .secondary_labels()
                .into_iter()
                .any(|label| query.matches(label))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Slug {
    #[serde(default)]
    pub current: String,
}

impl Slug {
    pub fn new(current: impl Into<String>) -> Self {
        Self {
            current: current.into(),
        }
    }
}

/// A dereferenced brand or department reference (`brand->{name, _id}`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NamedRef {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: String,
}

impl NamedRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: name.into(),
        }
    }
}

/// Raw document reference (`{_ref, _key}`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Reference {
    #[serde(rename = "_ref", default)]
    pub target: String,
    #[serde(rename = "_key", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ImageRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset: Option<Reference>,
}

/// One span of portable text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TextSpan {
    #[serde(default)]
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<String>,
}

/// One portable-text block; non-text blocks (images) deserialize with no children
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct TextBlock {
    #[serde(rename = "_type", default, skip_serializing_if = "Option::is_none")]
    pub block_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default)]
    pub children: Vec<TextSpan>,
}

impl TextBlock {
    pub fn paragraph(text: impl Into<String>) -> Self {
        Self {
            block_type: Some("block".to_string()),
            style: Some("normal".to_string()),
            children: vec![TextSpan {
                text: text.into(),
                marks: Vec::new(),
            }],
        }
    }

    pub fn is_text(&self) -> bool {
        self.block_type.as_deref() == Some("block")
    }

    pub fn plain_text(&self) -> String {
        self.children
            .iter()
            .map(|span| span.text.as_str())
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VariationField {
    #[serde(alias = "name", default)]
    pub key: String,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Variation {
    #[serde(rename = "_key", default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub fields: Vec<VariationField>,
}

/// Product document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "_updatedAt", default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: Slug,
    #[serde(default)]
    pub brand: Option<NamedRef>,
    #[serde(default)]
    pub department: Option<NamedRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: Vec<TextBlock>,
    #[serde(default)]
    pub main_image: Option<ImageRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub gallery: Vec<ImageRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub variations: Vec<Variation>,
}

impl Product {
    pub fn brand_name(&self) -> Option<&str> {
        self.brand.as_ref().map(|b| b.name.as_str())
    }

    pub fn department_name(&self) -> Option<&str> {
        self.department.as_ref().map(|d| d.name.as_str())
    }

    /// Plain text of all description blocks, paragraph-separated.
    pub fn description_text(&self) -> String {
        self.description
            .iter()
            .filter(|block| block.is_text())
            .map(TextBlock::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl CatalogEntity for Product {
    const KIND: EntityKind = EntityKind::Product;

    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.title
    }

    fn secondary_labels(&self) -> Vec<&str> {
        self.brand_name()
            .into_iter()
            .chain(self.department_name())
            .filter(|label| !label.is_empty())
            .collect()
    }

    fn slug(&self) -> Option<&str> {
        Some(self.slug.current.as_str()).filter(|s| !s.is_empty())
    }
}

/// Brand (manufacturer) document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Brand {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub logo: Option<ImageRef>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: Vec<TextBlock>,
}

impl CatalogEntity for Brand {
    const KIND: EntityKind = EntityKind::Brand;

    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn secondary_labels(&self) -> Vec<&str> {
        Vec::new()
    }
}

const BLOG_EXCERPT_FALLBACK: &str = "Read our latest article";

/// Blog post document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BlogPost {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "_updatedAt", default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: Slug,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub main_image: Option<ImageRef>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: Vec<TextBlock>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub related_products: Vec<Reference>,
}

impl BlogPost {
    /// Text of the first content block, or a fixed teaser when the post
    /// opens with something other than a text block.
    pub fn excerpt(&self) -> String {
        self.content
            .first()
            .filter(|block| block.is_text())
            .map(TextBlock::plain_text)
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| BLOG_EXCERPT_FALLBACK.to_string())
    }
}

impl CatalogEntity for BlogPost {
    const KIND: EntityKind = EntityKind::Blog;

    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.title
    }

    fn secondary_labels(&self) -> Vec<&str> {
        if self.author.is_empty() {
            Vec::new()
        } else {
            vec![self.author.as_str()]
        }
    }

    fn slug(&self) -> Option<&str> {
        Some(self.slug.current.as_str()).filter(|s| !s.is_empty())
    }
}

/// Department document, used for filter option lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Department {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: Option<Slug>,
}

impl CatalogEntity for Department {
    const KIND: EntityKind = EntityKind::Department;

    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn secondary_labels(&self) -> Vec<&str> {
        Vec::new()
    }

    fn slug(&self) -> Option<&str> {
        self.slug.as_ref().map(|s| s.current.as_str())
    }
}

// GROQ returns `null` for projected arrays that are absent on a document.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
