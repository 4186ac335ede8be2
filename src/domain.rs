//! Domain module - catalog entities, criteria and gateway contracts
//!
//! Nothing in here performs I/O. The gateway traits describe what the
//! browsing layer needs from a content backend; infrastructure supplies the
//! implementation.

pub mod criteria;
pub mod entities;
pub mod errors;
pub mod gateway;
pub mod pagination;
pub mod quote;
pub mod route;

pub use criteria::{FilterCriteria, FilterGroup, SearchQuery, BRAND_GROUP, DEPARTMENT_GROUP};
pub use entities::{BlogPost, Brand, CatalogEntity, Department, EntityKind, Product};
pub use errors::FetchError;
pub use gateway::{CountGateway, QueryGateway};
pub use pagination::{PageLink, PageState, DEFAULT_PAGE_SIZE};
pub use route::{ListingHeading, RouteSlug};
