//! Application layer: the browsing state machine and the services built on it

pub mod browser;
pub mod cache;
pub mod debounce;
pub mod sequence;
pub mod storefront;

pub use browser::{
    BrowseOutcome, BrowseState, BrowseView, CatalogBrowser, LoadingPhase, ResultSource,
    ScrollRequest, ScrollSink,
};
pub use cache::EntityCache;
pub use debounce::{InputAction, LiveSearchDebouncer};
pub use sequence::{RequestSequence, RequestTicket};
pub use storefront::{
    FilterOption, FilterOptions, ProductsPage, StorefrontGateway, StorefrontSession,
};
