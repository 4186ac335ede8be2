//! Gateway traits between the browsing layer and the content backend
//!
//! The browser is written against these traits only; the HTTP
//! implementation lives in `infrastructure::sanity_client` and tests bind an
//! in-memory recording gateway.

use async_trait::async_trait;

use crate::domain::criteria::{FilterCriteria, SearchQuery};
use crate::domain::entities::{CatalogEntity, Department};
use crate::domain::errors::FetchError;

/// Query operations for one entity kind
#[async_trait]
pub trait QueryGateway<E: CatalogEntity>: Send + Sync {
    /// Every entity of the kind, newest first.
    async fn list_all(&self) -> Result<Vec<E>, FetchError>;

    /// Server-side fuzzy search over the kind's searchable fields.
    async fn search_by_query(&self, query: &SearchQuery) -> Result<Vec<E>, FetchError>;

    /// Entities satisfying every non-empty filter group.
    async fn filter_by(&self, criteria: &FilterCriteria) -> Result<Vec<E>, FetchError>;

    /// Detail lookup; `Ok(None)` when no document has that slug.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<E>, FetchError>;
}

/// Counts and option lists for the filter sidebar
#[async_trait]
pub trait CountGateway: Send + Sync {
    async fn count_by_brand(&self, brand_id: &str) -> Result<u64, FetchError>;

    async fn count_by_department(&self, department_id: &str) -> Result<u64, FetchError>;

    async fn list_departments(&self) -> Result<Vec<Department>, FetchError>;
}
