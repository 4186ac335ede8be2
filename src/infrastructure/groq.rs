//! GROQ query builders
//!
//! Pure functions: each returns the query text plus the `$name` parameters
//! the HTTP layer sends alongside it. Filter values are inlined as JSON
//! string literals, so quotes and backslashes in identifiers are escaped.

use serde_json::Value;

use crate::domain::criteria::{BRAND_GROUP, DEPARTMENT_GROUP, FilterCriteria, SearchQuery};
use crate::domain::entities::EntityKind;
use crate::domain::errors::FetchError;

pub const SEARCH_PARAM: &str = "searchQuery";
pub const SLUG_PARAM: &str = "slug";
pub const REFERENCE_PARAM: &str = "refId";

const NEWEST_FIRST: &str = "order(_createdAt desc)";

const PRODUCT_PROJECTION: &str = r#"{
  _id,
  _createdAt,
  _updatedAt,
  title,
  brand->{name, _id},
  department->{name, _id},
  description,
  mainImage,
  gallery,
  "slug": slug,
  variations
}"#;

const BRAND_PROJECTION: &str = r#"{
  _id,
  name,
  logo,
  description
}"#;

const BLOG_PROJECTION: &str = r#"{
  _id,
  _createdAt,
  _updatedAt,
  title,
  "slug": slug,
  author,
  mainImage,
  publishedAt,
  content,
  relatedProducts
}"#;

const DEPARTMENT_PROJECTION: &str = r#"{
  _id,
  name,
  slug
}"#;

/// Query text with its parameters
#[derive(Debug, Clone, PartialEq)]
pub struct GroqQuery {
    pub query: String,
    pub params: Vec<(String, Value)>,
}

impl GroqQuery {
    fn new(query: String) -> Self {
        Self {
            query,
            params: Vec::new(),
        }
    }

    #[must_use]
    pub fn param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.push((name.to_string(), value.into()));
        self
    }
}

pub fn projection(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Product => PRODUCT_PROJECTION,
        EntityKind::Brand => BRAND_PROJECTION,
        EntityKind::Blog => BLOG_PROJECTION,
        EntityKind::Department => DEPARTMENT_PROJECTION,
    }
}

/// Text expressions matched by the server-side search.
pub fn search_fields(kind: EntityKind) -> &'static [&'static str] {
    match kind {
        EntityKind::Product => &["title", "pt::text(description)"],
        EntityKind::Brand => &["name"],
        EntityKind::Blog => &["title", "author", "pt::text(content)"],
        EntityKind::Department => &["name"],
    }
}

/// Document field a filter group constrains, if the kind supports it.
pub fn filter_field(kind: EntityKind, group_id: &str) -> Option<&'static str> {
    match (kind, group_id) {
        (EntityKind::Product, BRAND_GROUP) => Some("brand._ref"),
        (EntityKind::Product, DEPARTMENT_GROUP) => Some("department._ref"),
        (EntityKind::Brand, BRAND_GROUP) => Some("_id"),
        _ => None,
    }
}

fn type_predicate(kind: EntityKind) -> String {
    format!(r#"_type == "{}""#, kind.document_type())
}

/// `*text*`, so the match is a substring match rather than a prefix match.
pub fn wildcard(text: &str) -> String {
    format!("*{text}*")
}

pub fn list_all(kind: EntityKind) -> GroqQuery {
    GroqQuery::new(format!(
        "*[{}] | {NEWEST_FIRST} {}",
        type_predicate(kind),
        projection(kind)
    ))
}

pub fn search(kind: EntityKind, query: &SearchQuery) -> GroqQuery {
    let matches = search_fields(kind)
        .iter()
        .map(|field| format!("{field} match ${SEARCH_PARAM}"))
        .collect::<Vec<_>>()
        .join(" || ");

    GroqQuery::new(format!(
        "*[{} && ({matches})] | {NEWEST_FIRST} {}",
        type_predicate(kind),
        projection(kind)
    ))
    .param(SEARCH_PARAM, wildcard(query.as_str()))
}

/// AND across groups, membership (`in [...]`) within a group. Empty groups
/// add no constraint; an unconstrained filter is the full list.
pub fn filter(kind: EntityKind, criteria: &FilterCriteria) -> Result<GroqQuery, FetchError> {
    let mut predicates = vec![type_predicate(kind)];

    for group in criteria.active_groups() {
        let field = filter_field(kind, &group.group_id).ok_or_else(|| {
            FetchError::UnsupportedFilter {
                kind,
                group: group.group_id.clone(),
            }
        })?;

        let values = group
            .selected_values
            .iter()
            .map(|value| Value::String(value.clone()).to_string())
            .collect::<Vec<_>>()
            .join(", ");
        predicates.push(format!("{field} in [{values}]"));
    }

    Ok(GroqQuery::new(format!(
        "*[{}] | {NEWEST_FIRST} {}",
        predicates.join(" && "),
        projection(kind)
    )))
}

pub fn by_slug(kind: EntityKind, slug: &str) -> GroqQuery {
    GroqQuery::new(format!(
        "*[{} && slug.current == ${SLUG_PARAM}][0] {}",
        type_predicate(kind),
        projection(kind)
    ))
    .param(SLUG_PARAM, slug)
}

fn count_products_by(field: &str, id: &str) -> GroqQuery {
    GroqQuery::new(format!(
        "count(*[{} && {field} == ${REFERENCE_PARAM}])",
        type_predicate(EntityKind::Product)
    ))
    .param(REFERENCE_PARAM, id)
}

pub fn count_by_brand(brand_id: &str) -> GroqQuery {
    count_products_by("brand._ref", brand_id)
}

pub fn count_by_department(department_id: &str) -> GroqQuery {
    count_products_by("department._ref", department_id)
}

pub fn departments() -> GroqQuery {
    list_all(EntityKind::Department)
}
