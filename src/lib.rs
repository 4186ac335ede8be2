//! Medical-equipment storefront catalog browsing
//!
//! Client-side state for browsing products, brands and blog posts sourced
//! from a Sanity content backend: a cached full list, local-first text
//! search with a remote fallback, remote structured filters, debounced live
//! search and client-side pagination.

// Module declarations
pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod test_utils;

pub use application::{CatalogBrowser, LiveSearchDebouncer, StorefrontSession};
pub use domain::{CatalogEntity, FetchError, FilterCriteria, RouteSlug, SearchQuery};
pub use infrastructure::{AppConfig, SanityGateway};
