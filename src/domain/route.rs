//! Catch-all product route parsing and listing headings
//!
//! The products page is mounted on an optional catch-all route
//! (`/products`, `/products/item/<slug>`, `/products/category/<slug>`,
//! `/products/brand/<slug>`). Route parameters arrive in several shapes,
//! including a JSON-encoded segment list, so everything is normalized into a
//! [`RouteSlug`] once at this boundary.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::domain::criteria::FilterCriteria;
use crate::domain::entities::Product;

/// Category slug -> department identifier used by the department filter.
const CATEGORY_DEPARTMENTS: &[(&str, &str)] = &[
    ("diagnostic-equipment", "diagnostic"),
    ("surgical-instruments", "surgical"),
    ("monitoring-devices", "monitoring"),
    ("imaging-systems", "imaging"),
    ("laboratory-equipment", "laboratory"),
    ("dental-equipment", "dental"),
    ("physiotherapy-equipment", "physiotherapy"),
    ("emergency-care", "emergency"),
];

/// Brand slug -> manufacturer display name.
const BRAND_MANUFACTURERS: &[(&str, &str)] = &[
    ("siemens-healthineers", "Siemens Healthineers"),
    ("philips-healthcare", "Philips Healthcare"),
    ("ge-healthcare", "GE Healthcare"),
    ("medtronic", "Medtronic"),
    ("drager", "Drager"),
    ("carl-zeiss", "Carl Zeiss"),
];

const DEFAULT_TITLE: &str = "Medical Equipments";
const DEFAULT_DESCRIPTION: &str = "Find high-quality medical devices for your healthcare facility";
const DEFAULT_PLACEHOLDER: &str = "Search medical equipment...";

/// What the products route is showing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "slug", rename_all = "camelCase")]
#[ts(export)]
pub enum RouteSlug {
    /// Plain listing
    #[default]
    None,
    Item(String),
    Category(String),
    Brand(String),
}

impl RouteSlug {
    /// Interpret `[kind, value, ..]`. Unknown kinds or a missing/empty value
    /// fall back to the plain listing.
    pub fn parse_segments<S: AsRef<str>>(segments: &[S]) -> Self {
        let mut iter = segments.iter().map(|s| s.as_ref().trim());
        let (Some(kind), Some(value)) = (iter.next(), iter.next()) else {
            return Self::None;
        };
        if value.is_empty() {
            return Self::None;
        }

        let value = value.to_string();
        match kind {
            "item" => Self::Item(value),
            "category" => Self::Category(value),
            "brand" => Self::Brand(value),
            _ => Self::None,
        }
    }

    /// Accepts either a JSON array of segments (`["brand","ge-healthcare"]`)
    /// or a `/`-separated path (`brand/ge-healthcare`).
    pub fn parse_raw(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.starts_with('[') {
            return match serde_json::from_str::<Vec<String>>(raw) {
                Ok(segments) => Self::parse_segments(&segments),
                Err(_) => Self::None,
            };
        }

        let segments: Vec<&str> = raw.split('/').filter(|s| !s.is_empty()).collect();
        Self::parse_segments(&segments)
    }

    pub fn value(&self) -> Option<&str> {
        match self {
            Self::None => None,
            Self::Item(v) | Self::Category(v) | Self::Brand(v) => Some(v),
        }
    }

    pub fn is_listing(&self) -> bool {
        !matches!(self, Self::Item(_))
    }

    /// Filters a listing starts with. Only known category slugs seed a
    /// department filter.
    pub fn initial_filters(&self) -> FilterCriteria {
        match self {
            Self::Category(slug) => match department_for_category(slug) {
                Some(department) => FilterCriteria::new().departments([department]),
                None => FilterCriteria::new(),
            },
            _ => FilterCriteria::new(),
        }
    }
}

pub fn department_for_category(slug: &str) -> Option<&'static str> {
    CATEGORY_DEPARTMENTS
        .iter()
        .find(|(key, _)| *key == slug)
        .map(|(_, department)| *department)
}

pub fn manufacturer_for_brand(slug: &str) -> Option<&'static str> {
    BRAND_MANUFACTURERS
        .iter()
        .find(|(key, _)| *key == slug)
        .map(|(_, name)| *name)
}

/// `"surgical-instruments"` -> `"Surgical Instruments"`
pub fn title_case_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn brand_display_name(slug: &str) -> String {
    manufacturer_for_brand(slug)
        .map(str::to_string)
        .unwrap_or_else(|| title_case_slug(slug))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum BadgeKind {
    Category,
    Brand,
    Product,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Badge {
    pub text: String,
    pub kind: BadgeKind,
}

/// Hero copy for the products page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ListingHeading {
    pub title: String,
    pub description: String,
    pub search_placeholder: String,
    pub badge: Option<Badge>,
    pub subtitle: Option<String>,
}

impl Default for ListingHeading {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            search_placeholder: DEFAULT_PLACEHOLDER.to_string(),
            badge: None,
            subtitle: None,
        }
    }
}

impl ListingHeading {
    /// Derive the heading for `route`. An item route whose product has not
    /// been resolved yet gets the plain listing heading.
    pub fn for_route(route: &RouteSlug, product: Option<&Product>) -> Self {
        match route {
            RouteSlug::Item(_) => product.map(Self::for_product).unwrap_or_default(),
            RouteSlug::Category(slug) => {
                let name = title_case_slug(slug);
                let title = if name.is_empty() {
                    DEFAULT_TITLE.to_string()
                } else {
                    name.clone()
                };
                Self {
                    title,
                    description: format!("Browse our selection of high-quality {name}"),
                    search_placeholder: format!("Search {name}..."),
                    badge: Some(Badge {
                        text: "Category".to_string(),
                        kind: BadgeKind::Category,
                    }),
                    subtitle: None,
                }
            }
            RouteSlug::Brand(slug) => {
                let name = brand_display_name(slug);
                Self {
                    title: name.clone(),
                    description: format!("Explore medical equipment from {name}"),
                    search_placeholder: format!("Search {name} products..."),
                    badge: Some(Badge {
                        text: "Brand".to_string(),
                        kind: BadgeKind::Brand,
                    }),
                    subtitle: None,
                }
            }
            RouteSlug::None => Self::default(),
        }
    }

    fn for_product(product: &Product) -> Self {
        let brand = product.brand_name().unwrap_or_default();
        let department = product.department_name().unwrap_or_default();

        let description = match (brand.is_empty(), department.is_empty()) {
            (false, false) => format!("{} by {brand} - {department}", product.title),
            (false, true) => format!("{} by {brand}", product.title),
            _ => product.title.clone(),
        };
        let search_placeholder = if department.is_empty() {
            DEFAULT_PLACEHOLDER.to_string()
        } else {
            format!("Search similar {department} equipment...")
        };

        Self {
            title: product.title.clone(),
            description,
            search_placeholder,
            badge: Some(Badge {
                text: if department.is_empty() {
                    "Department".to_string()
                } else {
                    department.to_string()
                },
                kind: BadgeKind::Product,
            }),
            subtitle: (!brand.is_empty()).then(|| format!("By {brand}")),
        }
    }
}
