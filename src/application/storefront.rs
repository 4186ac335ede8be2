//! Per-session storefront facade
//!
//! Builds one browser per browsable kind against a single shared gateway and
//! adds the page-level operations around them: opening the products route,
//! detail lookups and the filter sidebar options.

use std::sync::Arc;

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use crate::application::browser::{BrowseOutcome, CatalogBrowser};
use crate::domain::criteria::FilterCriteria;
use crate::domain::entities::{BlogPost, Brand, CatalogEntity, Product};
use crate::domain::errors::FetchError;
use crate::domain::gateway::{CountGateway, QueryGateway};
use crate::domain::route::{ListingHeading, RouteSlug};
use crate::infrastructure::config::BrowsingConfig;

/// Everything a content backend must offer the storefront
pub trait StorefrontGateway:
    QueryGateway<Product> + QueryGateway<Brand> + QueryGateway<BlogPost> + CountGateway + 'static
{
}

impl<T> StorefrontGateway for T where
    T: QueryGateway<Product> + QueryGateway<Brand> + QueryGateway<BlogPost> + CountGateway + 'static
{
}

/// One selectable option in the filter sidebar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FilterOption {
    pub id: String,
    pub label: String,
    /// Product count badge; `None` when the count could not be fetched
    pub count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct FilterOptions {
    pub departments: Vec<FilterOption>,
    pub brands: Vec<FilterOption>,
}

/// Result of opening `/products/...`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsPage {
    pub route: RouteSlug,
    pub heading: ListingHeading,
    /// Resolved product for item routes
    pub product: Option<Product>,
    pub initial_filters: FilterCriteria,
}

pub struct StorefrontSession<G> {
    session_id: Uuid,
    gateway: Arc<G>,
    pub products: Arc<CatalogBrowser<Product, G>>,
    pub brands: Arc<CatalogBrowser<Brand, G>>,
    pub blogs: Arc<CatalogBrowser<BlogPost, G>>,
}

impl<G: StorefrontGateway> StorefrontSession<G> {
    pub fn new(gateway: Arc<G>, settings: &BrowsingConfig) -> Self {
        let session_id = Uuid::new_v4();
        debug!("Storefront session {} started", session_id);
        Self {
            session_id,
            products: Arc::new(CatalogBrowser::new(Arc::clone(&gateway), settings.clone())),
            brands: Arc::new(CatalogBrowser::new(Arc::clone(&gateway), settings.clone())),
            blogs: Arc::new(CatalogBrowser::new(Arc::clone(&gateway), settings.clone())),
            gateway,
        }
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    /// Correlates log lines of one page session.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Load the product list, resolve the route's heading, and apply the
    /// route's initial filters when it has any.
    pub async fn open_products(&self, route: &RouteSlug) -> Result<ProductsPage, FetchError> {
        info!("[{}] Opening products route {:?}", self.session_id, route);
        self.products.load_all().await?;

        let product = match route {
            RouteSlug::Item(slug) => self.resolve_product(slug).await?,
            _ => None,
        };

        let initial_filters = route.initial_filters();
        if !initial_filters.is_unconstrained() {
            let outcome = self.products.apply_filters(&initial_filters).await?;
            debug!("Initial route filters applied: {:?}", outcome);
        }

        Ok(ProductsPage {
            heading: ListingHeading::for_route(route, product.as_ref()),
            route: route.clone(),
            product,
            initial_filters,
        })
    }

    // Cached list first, then the detail query
    async fn resolve_product(&self, slug: &str) -> Result<Option<Product>, FetchError> {
        let cached = self
            .products
            .cached()
            .await
            .into_iter()
            .find(|p| CatalogEntity::slug(p) == Some(slug));
        match cached {
            Some(product) => Ok(Some(product)),
            None => self.product_detail(slug).await,
        }
    }

    pub async fn product_detail(&self, slug: &str) -> Result<Option<Product>, FetchError> {
        QueryGateway::<Product>::find_by_slug(self.gateway.as_ref(), slug).await
    }

    pub async fn blog_detail(&self, slug: &str) -> Result<Option<BlogPost>, FetchError> {
        QueryGateway::<BlogPost>::find_by_slug(self.gateway.as_ref(), slug).await
    }

    /// Departments and brands for the sidebar, each with a product count.
    /// Counts are fetched concurrently; a failed count leaves its badge empty.
    pub async fn filter_options(&self) -> Result<FilterOptions, FetchError> {
        let departments = self.gateway.list_departments().await?;
        let brands = self.brand_options().await?;

        let department_counts = join_all(
            departments
                .iter()
                .map(|d| self.gateway.count_by_department(&d.id)),
        );
        let brand_counts = join_all(brands.iter().map(|b| self.gateway.count_by_brand(&b.id)));
        let (department_counts, brand_counts) = tokio::join!(department_counts, brand_counts);

        let departments = departments
            .into_iter()
            .zip(department_counts)
            .map(|(d, count)| option(d.id, d.name, count))
            .collect();
        let brands = brands
            .into_iter()
            .zip(brand_counts)
            .map(|(b, count)| option(b.id, b.name, count))
            .collect();

        Ok(FilterOptions { departments, brands })
    }

    // Read-only: the brand browser's displayed list and tickets are untouched
    async fn brand_options(&self) -> Result<Vec<Brand>, FetchError> {
        if self.brands.is_cache_populated().await {
            return Ok(self.brands.cached().await);
        }
        QueryGateway::<Brand>::list_all(self.gateway.as_ref()).await
    }

    /// Open all three listings, as the landing page does.
    pub async fn preload(&self) -> Vec<Result<BrowseOutcome, FetchError>> {
        let (products, brands, blogs) = tokio::join!(
            self.products.load_all(),
            self.brands.load_all(),
            self.blogs.load_all()
        );
        vec![products, brands, blogs]
    }
}

fn option(id: String, label: String, count: Result<u64, FetchError>) -> FilterOption {
    let count = match count {
        Ok(n) => Some(n),
        Err(err) => {
            warn!("Count for '{}' unavailable: {}", id, err);
            None
        }
    };
    FilterOption { id, label, count }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::browser::BrowseState;
    use crate::domain::criteria::DEPARTMENT_GROUP;
    use crate::domain::route::BadgeKind;
    use crate::test_utils::{GatewayCall, InMemoryStorefront, fixtures};

    fn session(store: InMemoryStorefront) -> StorefrontSession<InMemoryStorefront> {
        StorefrontSession::new(Arc::new(store), &BrowsingConfig::default())
    }

    #[tokio::test]
    async fn test_category_route_seeds_department_filter() {
        let store = InMemoryStorefront::new(fixtures::products(6), fixtures::brands(), Vec::new());
        let surgical = FilterCriteria::new().departments(["surgical"]);
        store.products.set_filter_results(&surgical, fixtures::products(2));
        let session = session(store);

        let page = session
            .open_products(&RouteSlug::Category("surgical-instruments".into()))
            .await
            .unwrap();

        assert_eq!(page.initial_filters.selected(DEPARTMENT_GROUP), ["surgical".to_string()]);
        assert_eq!(page.heading.title, "Surgical Instruments");
        assert_eq!(session.products.displayed_len().await, 2);
        assert_eq!(session.gateway().products.calls(GatewayCall::Filter), 1);
    }

    #[tokio::test]
    async fn test_item_route_resolves_from_loaded_list() {
        let products = fixtures::products(3);
        let wanted = products[1].clone();
        let session = session(InMemoryStorefront::new(products, Vec::new(), Vec::new()));

        let page = session
            .open_products(&RouteSlug::Item(wanted.slug.current.clone()))
            .await
            .unwrap();

        assert_eq!(page.product.as_ref(), Some(&wanted));
        assert_eq!(page.heading.title, wanted.title);
        assert_eq!(page.heading.badge.map(|b| b.kind), Some(BadgeKind::Product));
        assert_eq!(session.gateway().products.calls(GatewayCall::FindBySlug), 0);
    }

    #[tokio::test]
    async fn test_unknown_item_falls_back_to_listing_heading() {
        let session = session(InMemoryStorefront::new(fixtures::products(3), Vec::new(), Vec::new()));

        let page = session
            .open_products(&RouteSlug::Item("discontinued-model".into()))
            .await
            .unwrap();

        assert!(page.product.is_none());
        assert_eq!(page.heading, ListingHeading::default());
        assert_eq!(session.gateway().products.calls(GatewayCall::FindBySlug), 1);
    }

    #[tokio::test]
    async fn test_blog_detail_by_slug() {
        let posts = fixtures::blog_posts();
        let slug = posts[0].slug.current.clone();
        let session = session(InMemoryStorefront::new(Vec::new(), Vec::new(), posts.clone()));

        assert_eq!(session.blog_detail(&slug).await.unwrap(), Some(posts[0].clone()));
        assert_eq!(session.blog_detail("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_filter_options_degrade_failed_counts() {
        let store = InMemoryStorefront::new(fixtures::products(4), fixtures::brands(), Vec::new())
            .with_departments(fixtures::departments())
            .with_department_count("imaging", 7)
            .with_brand_count("brand-ge", 3)
            .with_failing_count("brand-medtronic");
        let session = session(store);

        let options = session.filter_options().await.unwrap();

        let imaging = options.departments.iter().find(|o| o.id == "imaging").unwrap();
        assert_eq!(imaging.count, Some(7));
        let ge = options.brands.iter().find(|o| o.id == "brand-ge").unwrap();
        assert_eq!(ge.count, Some(3));
        let medtronic = options.brands.iter().find(|o| o.id == "brand-medtronic").unwrap();
        assert_eq!(medtronic.count, None);
        assert_eq!(options.brands.len(), fixtures::brands().len());
    }

    #[tokio::test]
    async fn test_filter_options_leave_brand_search_in_place() {
        let store = InMemoryStorefront::new(Vec::new(), fixtures::brands(), Vec::new())
            .with_departments(fixtures::departments());
        let session = session(store);
        session.brands.load_all().await.unwrap();
        let searched = session.brands.search("ge", None).await.unwrap();
        let before = session.brands.displayed().await;

        let options = session.filter_options().await.unwrap();

        assert_eq!(options.brands.len(), fixtures::brands().len());
        assert_eq!(session.brands.displayed().await, before);
        assert_eq!(session.brands.displayed_len().await, searched.count().unwrap());
        assert_eq!(session.gateway().brands.calls(GatewayCall::ListAll), 1);
    }

    #[tokio::test]
    async fn test_filter_options_before_brands_load_do_not_fill_browser() {
        let store = InMemoryStorefront::new(Vec::new(), fixtures::brands(), Vec::new())
            .with_departments(fixtures::departments());
        let session = session(store);

        let options = session.filter_options().await.unwrap();

        assert_eq!(options.brands.len(), fixtures::brands().len());
        assert_eq!(session.brands.state().await, BrowseState::Idle);
        assert_eq!(session.brands.displayed_len().await, 0);
        assert_eq!(session.gateway().brands.calls(GatewayCall::ListAll), 1);
    }

    #[tokio::test]
    async fn test_preload_loads_each_kind_once() {
        let store =
            InMemoryStorefront::new(fixtures::products(2), fixtures::brands(), fixtures::blog_posts());
        let session = session(store);

        assert!(session.preload().await.iter().all(Result::is_ok));
        session.preload().await;

        let gateway = session.gateway();
        assert_eq!(gateway.products.calls(GatewayCall::ListAll), 1);
        assert_eq!(gateway.brands.calls(GatewayCall::ListAll), 1);
        assert_eq!(gateway.blogs.calls(GatewayCall::ListAll), 1);
    }
}
