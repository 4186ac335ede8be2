//! Test utilities
//!
//! In-memory gateways that record every call, plus fixture builders. Unit
//! tests, the integration tests, the benchmark and the sanity binary all
//! drive the browser through these instead of a live content backend.

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::application::browser::{ScrollRequest, ScrollSink};
use crate::domain::criteria::{FilterCriteria, SearchQuery};
use crate::domain::entities::{BlogPost, Brand, CatalogEntity, Department, Product};
use crate::domain::errors::FetchError;
use crate::domain::gateway::{CountGateway, QueryGateway};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayCall {
    ListAll,
    Search,
    Filter,
    FindBySlug,
}

/// Scriptable [`QueryGateway`] for one entity kind.
///
/// Unscripted behaviour: `list_all` returns the catalog, `search_by_query`
/// scans the catalog with [`CatalogEntity::matches`], `filter_by` returns the
/// catalog for unconstrained criteria and nothing otherwise.
pub struct RecordingGateway<E> {
    catalog: Mutex<Vec<E>>,
    search_results: Mutex<HashMap<String, Vec<E>>>,
    filter_results: Mutex<Vec<(FilterCriteria, Vec<E>)>>,
    failures: Mutex<HashMap<GatewayCall, FetchError>>,
    delays: Mutex<HashMap<GatewayCall, Duration>>,
    search_delays: Mutex<HashMap<String, Duration>>,
    counters: Mutex<HashMap<GatewayCall, usize>>,
    search_log: Mutex<Vec<String>>,
    filter_log: Mutex<Vec<FilterCriteria>>,
}

impl<E: CatalogEntity> RecordingGateway<E> {
    pub fn new(catalog: Vec<E>) -> Self {
        Self {
            catalog: Mutex::new(catalog),
            search_results: Mutex::new(HashMap::new()),
            filter_results: Mutex::new(Vec::new()),
            failures: Mutex::new(HashMap::new()),
            delays: Mutex::new(HashMap::new()),
            search_delays: Mutex::new(HashMap::new()),
            counters: Mutex::new(HashMap::new()),
            search_log: Mutex::new(Vec::new()),
            filter_log: Mutex::new(Vec::new()),
        }
    }

    pub fn set_catalog(&self, catalog: Vec<E>) {
        *lock(&self.catalog) = catalog;
    }

    /// Response for an exact (trimmed) search text.
    pub fn set_search_results(&self, query: &str, results: Vec<E>) {
        lock(&self.search_results).insert(query.trim().to_string(), results);
    }

    pub fn set_filter_results(&self, criteria: &FilterCriteria, results: Vec<E>) {
        let mut scripted = lock(&self.filter_results);
        scripted.retain(|(c, _)| c != criteria);
        scripted.push((criteria.clone(), results));
    }

    /// Make every subsequent `call` fail with `error` until [`Self::recover`].
    pub fn fail(&self, call: GatewayCall, error: FetchError) {
        lock(&self.failures).insert(call, error);
    }

    pub fn recover(&self, call: GatewayCall) {
        lock(&self.failures).remove(&call);
    }

    pub fn delay(&self, call: GatewayCall, delay: Duration) {
        lock(&self.delays).insert(call, delay);
    }

    /// Delay only searches for this exact text; overrides [`Self::delay`].
    pub fn delay_search(&self, query: &str, delay: Duration) {
        lock(&self.search_delays).insert(query.trim().to_string(), delay);
    }

    pub fn calls(&self, call: GatewayCall) -> usize {
        lock(&self.counters).get(&call).copied().unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        lock(&self.counters).values().sum()
    }

    pub fn search_queries(&self) -> Vec<String> {
        lock(&self.search_log).clone()
    }

    pub fn filter_requests(&self) -> Vec<FilterCriteria> {
        lock(&self.filter_log).clone()
    }

    fn record(&self, call: GatewayCall) {
        *lock(&self.counters).entry(call).or_insert(0) += 1;
    }

    async fn pause(&self, call: GatewayCall, search_text: Option<&str>) {
        let specific = search_text.and_then(|text| lock(&self.search_delays).get(text).copied());
        let delay = specific.or_else(|| lock(&self.delays).get(&call).copied());
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn check(&self, call: GatewayCall) -> Result<(), FetchError> {
        match lock(&self.failures).get(&call) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<E: CatalogEntity> QueryGateway<E> for RecordingGateway<E> {
    async fn list_all(&self) -> Result<Vec<E>, FetchError> {
        self.record(GatewayCall::ListAll);
        self.pause(GatewayCall::ListAll, None).await;
        self.check(GatewayCall::ListAll)?;
        Ok(lock(&self.catalog).clone())
    }

    async fn search_by_query(&self, query: &SearchQuery) -> Result<Vec<E>, FetchError> {
        self.record(GatewayCall::Search);
        lock(&self.search_log).push(query.as_str().to_string());
        self.pause(GatewayCall::Search, Some(query.as_str())).await;
        self.check(GatewayCall::Search)?;

        let scripted = lock(&self.search_results).get(query.as_str()).cloned();
        Ok(scripted.unwrap_or_else(|| {
            lock(&self.catalog)
                .iter()
                .filter(|entity| entity.matches(query))
                .cloned()
                .collect()
        }))
    }

    async fn filter_by(&self, criteria: &FilterCriteria) -> Result<Vec<E>, FetchError> {
        self.record(GatewayCall::Filter);
        lock(&self.filter_log).push(criteria.clone());
        self.pause(GatewayCall::Filter, None).await;
        self.check(GatewayCall::Filter)?;

        let scripted = lock(&self.filter_results)
            .iter()
            .find(|(c, _)| c == criteria)
            .map(|(_, results)| results.clone());
        Ok(match scripted {
            Some(results) => results,
            None if criteria.is_unconstrained() => lock(&self.catalog).clone(),
            None => Vec::new(),
        })
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<E>, FetchError> {
        self.record(GatewayCall::FindBySlug);
        self.pause(GatewayCall::FindBySlug, None).await;
        self.check(GatewayCall::FindBySlug)?;
        Ok(lock(&self.catalog)
            .iter()
            .find(|entity| entity.slug() == Some(slug))
            .cloned())
    }
}

/// One recording gateway per kind plus sidebar counts
pub struct InMemoryStorefront {
    pub products: RecordingGateway<Product>,
    pub brands: RecordingGateway<Brand>,
    pub blogs: RecordingGateway<BlogPost>,
    departments: Vec<Department>,
    brand_counts: HashMap<String, u64>,
    department_counts: HashMap<String, u64>,
    failing_counts: HashSet<String>,
}

impl InMemoryStorefront {
    pub fn new(products: Vec<Product>, brands: Vec<Brand>, blogs: Vec<BlogPost>) -> Self {
        Self {
            products: RecordingGateway::new(products),
            brands: RecordingGateway::new(brands),
            blogs: RecordingGateway::new(blogs),
            departments: Vec::new(),
            brand_counts: HashMap::new(),
            department_counts: HashMap::new(),
            failing_counts: HashSet::new(),
        }
    }

    #[must_use]
    pub fn with_departments(mut self, departments: Vec<Department>) -> Self {
        self.departments = departments;
        self
    }

    #[must_use]
    pub fn with_brand_count(mut self, brand_id: &str, count: u64) -> Self {
        self.brand_counts.insert(brand_id.to_string(), count);
        self
    }

    #[must_use]
    pub fn with_department_count(mut self, department_id: &str, count: u64) -> Self {
        self.department_counts.insert(department_id.to_string(), count);
        self
    }

    /// Count lookups for this brand or department id fail.
    #[must_use]
    pub fn with_failing_count(mut self, id: &str) -> Self {
        self.failing_counts.insert(id.to_string());
        self
    }

    fn count(&self, counts: &HashMap<String, u64>, id: &str) -> Result<u64, FetchError> {
        if self.failing_counts.contains(id) {
            return Err(FetchError::transport(format!("count for {id} unavailable")));
        }
        Ok(counts.get(id).copied().unwrap_or(0))
    }
}

macro_rules! delegate_query_gateway {
    ($entity:ty, $field:ident) => {
        #[async_trait]
        impl QueryGateway<$entity> for InMemoryStorefront {
            async fn list_all(&self) -> Result<Vec<$entity>, FetchError> {
                self.$field.list_all().await
            }

            async fn search_by_query(&self, query: &SearchQuery) -> Result<Vec<$entity>, FetchError> {
                self.$field.search_by_query(query).await
            }

            async fn filter_by(&self, criteria: &FilterCriteria) -> Result<Vec<$entity>, FetchError> {
                self.$field.filter_by(criteria).await
            }

            async fn find_by_slug(&self, slug: &str) -> Result<Option<$entity>, FetchError> {
                self.$field.find_by_slug(slug).await
            }
        }
    };
}

delegate_query_gateway!(Product, products);
delegate_query_gateway!(Brand, brands);
delegate_query_gateway!(BlogPost, blogs);

#[async_trait]
impl CountGateway for InMemoryStorefront {
    async fn count_by_brand(&self, brand_id: &str) -> Result<u64, FetchError> {
        self.count(&self.brand_counts, brand_id)
    }

    async fn count_by_department(&self, department_id: &str) -> Result<u64, FetchError> {
        self.count(&self.department_counts, department_id)
    }

    async fn list_departments(&self) -> Result<Vec<Department>, FetchError> {
        Ok(self.departments.clone())
    }
}

/// Collects scroll requests from a browser
#[derive(Debug, Default)]
pub struct ScrollRecorder {
    requests: Mutex<Vec<ScrollRequest>>,
}

impl ScrollRecorder {
    pub fn requests(&self) -> Vec<ScrollRequest> {
        lock(&self.requests).clone()
    }

    pub fn pages(&self) -> Vec<usize> {
        self.requests().iter().map(|r| r.page).collect()
    }
}

impl ScrollSink for ScrollRecorder {
    fn scroll_to_top(&self, request: ScrollRequest) {
        lock(&self.requests).push(request);
    }
}

/// Fixture builders
pub mod fixtures {
    use crate::domain::entities::{
        BlogPost, Brand, Department, NamedRef, Product, Slug, TextBlock,
    };

    const EQUIPMENT: &[&str] = &[
        "Patient Monitor",
        "Infusion Pump",
        "Ultrasound Scanner",
        "Surgical Light",
        "Anesthesia Machine",
        "Defibrillator",
        "ECG Machine",
        "Autoclave",
        "Dental Chair",
        "Centrifuge",
        "Hospital Bed",
        "Suction Unit",
    ];

    const BRANDS: &[(&str, &str)] = &[
        ("brand-siemens", "Siemens Healthineers"),
        ("brand-philips", "Philips Healthcare"),
        ("brand-ge", "GE Healthcare"),
        ("brand-medtronic", "Medtronic"),
        ("brand-drager", "Drager"),
    ];

    const DEPARTMENTS: &[(&str, &str)] = &[
        ("imaging", "Imaging"),
        ("monitoring", "Monitoring"),
        ("surgical", "Surgical"),
    ];

    pub fn slugify(text: &str) -> String {
        text.split_whitespace()
            .map(str::to_lowercase)
            .collect::<Vec<_>>()
            .join("-")
    }

    pub fn product(id: &str, title: &str, brand: &str, department: &str) -> Product {
        Product {
            id: id.to_string(),
            title: title.to_string(),
            slug: Slug::new(slugify(title)),
            brand: Some(NamedRef::new(format!("brand-{}", slugify(brand)), brand)),
            department: Some(NamedRef::new(slugify(department), department)),
            description: vec![TextBlock::paragraph(format!("{title} for clinical use"))],
            ..Product::default()
        }
    }

    /// `count` products with distinct titles, cycling through brands and
    /// departments.
    pub fn products(count: usize) -> Vec<Product> {
        (0..count)
            .map(|i| {
                let (brand_id, brand_name) = BRANDS[i % BRANDS.len()];
                let (dept_id, dept_name) = DEPARTMENTS[i % DEPARTMENTS.len()];
                let title = format!("{} {}", EQUIPMENT[i % EQUIPMENT.len()], i + 1);
                Product {
                    id: format!("prod-{}", i + 1),
                    slug: Slug::new(slugify(&title)),
                    brand: Some(NamedRef::new(brand_id, brand_name)),
                    department: Some(NamedRef::new(dept_id, dept_name)),
                    description: vec![TextBlock::paragraph(format!("{title} for clinical use"))],
                    title,
                    ..Product::default()
                }
            })
            .collect()
    }

    pub fn brand(id: &str, name: &str) -> Brand {
        Brand {
            id: id.to_string(),
            name: name.to_string(),
            ..Brand::default()
        }
    }

    pub fn brands() -> Vec<Brand> {
        BRANDS.iter().map(|(id, name)| brand(id, name)).collect()
    }

    pub fn blog_post(id: &str, title: &str, author: &str) -> BlogPost {
        BlogPost {
            id: id.to_string(),
            title: title.to_string(),
            slug: Slug::new(slugify(title)),
            author: author.to_string(),
            content: vec![TextBlock::paragraph(format!("Notes on {title}"))],
            ..BlogPost::default()
        }
    }

    pub fn blog_posts() -> Vec<BlogPost> {
        vec![
            blog_post("blog-1", "Choosing a Defibrillator", "Dr. Okafor"),
            blog_post("blog-2", "Autoclave Maintenance Checklist", "Lena Brandt"),
            blog_post("blog-3", "Planning an Imaging Suite", "Dr. Okafor"),
        ]
    }

    pub fn departments() -> Vec<Department> {
        DEPARTMENTS
            .iter()
            .map(|(id, name)| Department {
                id: id.to_string(),
                name: name.to_string(),
                slug: Some(Slug::new(*id)),
            })
            .collect()
    }
}
