//! Catalog browsing state machine
//!
//! One [`CatalogBrowser`] drives a single entity kind (products, brands or
//! blog posts) through list acquisition, text search, structured filtering
//! and client-side pagination:
//!
//! ```text
//! Idle -> Loading(Initial) -> Ready -> Loading(Search | Filter) -> Ready -> ...
//! ```
//!
//! - the full list is fetched at most once per browser and cached
//! - short queries are answered from the cache when it has matches
//! - filters always go to the gateway
//! - every list-replacing operation takes a ticket from [`RequestSequence`];
//!   a response is applied only if its ticket is still the latest
//!
//! Gateway failures are returned as typed errors and recorded in
//! `last_error`; the displayed list is left as it was.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use ts_rs::TS;

use crate::application::cache::EntityCache;
use crate::application::sequence::{RequestSequence, RequestTicket};
use crate::domain::criteria::{FilterCriteria, SearchQuery};
use crate::domain::entities::{CatalogEntity, EntityKind};
use crate::domain::errors::FetchError;
use crate::domain::gateway::QueryGateway;
use crate::domain::pagination::{self, PageLink, PageState};
use crate::infrastructure::config::BrowsingConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum LoadingPhase {
    Initial,
    Search,
    Filter,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "status", content = "phase", rename_all = "camelCase")]
#[ts(export)]
pub enum BrowseState {
    #[default]
    Idle,
    Loading(LoadingPhase),
    Ready,
}

impl BrowseState {
    pub fn is_loading(self) -> bool {
        matches!(self, Self::Loading(_))
    }
}

/// Where an applied list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub enum ResultSource {
    /// Restored from the session cache
    Cache,
    /// Case-insensitive scan of the cache
    LocalScan,
    /// Results the caller fetched itself
    Precomputed,
    Gateway,
}

/// What a browse operation did to the displayed list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "outcome", rename_all = "camelCase")]
#[ts(export)]
pub enum BrowseOutcome {
    Applied { source: ResultSource, count: usize },
    /// A newer operation was issued before this one completed; its response
    /// was discarded.
    Superseded,
}

impl BrowseOutcome {
    pub fn source(self) -> Option<ResultSource> {
        match self {
            Self::Applied { source, .. } => Some(source),
            Self::Superseded => None,
        }
    }

    pub fn count(self) -> Option<usize> {
        match self {
            Self::Applied { count, .. } => Some(count),
            Self::Superseded => None,
        }
    }

    pub fn is_superseded(self) -> bool {
        matches!(self, Self::Superseded)
    }
}

/// Scroll-to-top request emitted on page change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ScrollRequest {
    pub page: usize,
    pub smooth: bool,
}

/// Receives the scroll side effect of [`CatalogBrowser::set_page`]
pub trait ScrollSink: Send + Sync {
    fn scroll_to_top(&self, request: ScrollRequest);
}

impl<F> ScrollSink for F
where
    F: Fn(ScrollRequest) + Send + Sync,
{
    fn scroll_to_top(&self, request: ScrollRequest) {
        self(request)
    }
}

/// Render-ready snapshot of a browser
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseView<E> {
    pub kind: EntityKind,
    pub state: BrowseState,
    pub current_page: usize,
    pub page_size: usize,
    pub total_pages: usize,
    pub total_items: usize,
    pub items: Vec<E>,
    pub page_links: Vec<PageLink>,
    pub has_previous: bool,
    pub has_next: bool,
    /// Ready with nothing to show; the "no results" state
    pub is_empty: bool,
    pub last_error: Option<String>,
}

struct BrowserInner<E> {
    cache: EntityCache<E>,
    displayed: Vec<E>,
    page: PageState,
    state: BrowseState,
    last_error: Option<FetchError>,
    // Blank search applied while the first list was still in flight
    pending_restore: Option<RequestTicket>,
}

impl<E: CatalogEntity> BrowserInner<E> {
    fn apply(&mut self, entries: Vec<E>, source: ResultSource) -> BrowseOutcome {
        let count = entries.len();
        self.displayed = entries;
        self.page.reset();
        self.state = BrowseState::Ready;
        self.last_error = None;
        self.pending_restore = None;
        BrowseOutcome::Applied { source, count }
    }
}

pub struct CatalogBrowser<E, G> {
    gateway: Arc<G>,
    settings: BrowsingConfig,
    inner: RwLock<BrowserInner<E>>,
    sequence: RequestSequence,
    // Serializes full loads so concurrent callers share one fetch
    load_guard: Mutex<()>,
    scroll_sink: Option<Arc<dyn ScrollSink>>,
}

impl<E, G> CatalogBrowser<E, G>
where
    E: CatalogEntity,
    G: QueryGateway<E>,
{
    pub fn new(gateway: Arc<G>, settings: BrowsingConfig) -> Self {
        let page = PageState::new(settings.page_size);
        Self {
            gateway,
            settings,
            inner: RwLock::new(BrowserInner {
                cache: EntityCache::new(),
                displayed: Vec::new(),
                page,
                state: BrowseState::Idle,
                last_error: None,
                pending_restore: None,
            }),
            sequence: RequestSequence::new(),
            load_guard: Mutex::new(()),
            scroll_sink: None,
        }
    }

    #[must_use]
    pub fn with_scroll_sink(mut self, sink: Arc<dyn ScrollSink>) -> Self {
        self.scroll_sink = Some(sink);
        self
    }

    pub fn kind(&self) -> EntityKind {
        E::KIND
    }

    pub fn gateway(&self) -> &Arc<G> {
        &self.gateway
    }

    pub fn settings(&self) -> &BrowsingConfig {
        &self.settings
    }

    /// Show the full list. The first successful call fetches it and fills
    /// the cache; later calls restore it from the cache.
    pub async fn load_all(&self) -> Result<BrowseOutcome, FetchError> {
        let _loading = self.load_guard.lock().await;
        self.load_locked().await
    }

    // Caller holds `load_guard`
    async fn load_locked(&self) -> Result<BrowseOutcome, FetchError> {
        let ticket = {
            let mut inner = self.inner.write().await;
            let ticket = self.sequence.issue();
            if inner.cache.is_populated() {
                let entries = inner.cache.snapshot();
                debug!("Restored {} {} entities from cache", entries.len(), E::KIND);
                return Ok(inner.apply(entries, ResultSource::Cache));
            }
            inner.state = BrowseState::Loading(LoadingPhase::Initial);
            ticket
        };

        info!("🔄 Loading all {} entities", E::KIND);
        let result = self.gateway.list_all().await;

        let mut inner = self.inner.write().await;
        match result {
            Ok(entries) => {
                inner.cache.populate(entries.clone());
                if !self.list_still_wanted(&inner, ticket) {
                    debug!("Discarding stale {} list {} (cache kept)", E::KIND, ticket);
                    return Ok(BrowseOutcome::Superseded);
                }
                info!("✅ Loaded {} {} entities", entries.len(), E::KIND);
                Ok(inner.apply(entries, ResultSource::Gateway))
            }
            Err(err) => {
                let current = self.list_still_wanted(&inner, ticket);
                self.settle_failure(&mut inner, ticket, current, "load", err)
            }
        }
    }

    /// A full list is still wanted when its own ticket is the latest, or when
    /// the latest operation was a blank search that restored the (then still
    /// empty) cache.
    fn list_still_wanted(&self, inner: &BrowserInner<E>, ticket: RequestTicket) -> bool {
        self.sequence.is_latest(ticket)
            || inner
                .pending_restore
                .is_some_and(|restore| self.sequence.is_latest(restore))
    }

    /// Drop the cache and fetch the full list again. Waits for any load
    /// already in flight so its response cannot refill the cache.
    pub async fn reload(&self) -> Result<BrowseOutcome, FetchError> {
        let _loading = self.load_guard.lock().await;
        self.inner.write().await.cache.invalidate();
        self.load_locked().await
    }

    /// Text search.
    ///
    /// Blank input restores the cached list. Input of up to
    /// `local_search_max_chars` characters is matched against the cache and
    /// used if anything matches. Everything else uses `precomputed` when
    /// given, or asks the gateway.
    pub async fn search(
        &self,
        raw_query: &str,
        precomputed: Option<Vec<E>>,
    ) -> Result<BrowseOutcome, FetchError> {
        let query = SearchQuery::new(raw_query);

        let ticket = {
            let mut inner = self.inner.write().await;
            let ticket = self.sequence.issue();

            if query.is_blank() {
                let entries = inner.cache.snapshot();
                debug!("Search cleared, restoring {} {} entities", entries.len(), E::KIND);
                // A held load guard with an empty cache means the first list is in flight
                let awaiting_list =
                    !inner.cache.is_populated() && self.load_guard.try_lock().is_err();
                let outcome = inner.apply(entries, ResultSource::Cache);
                if awaiting_list {
                    inner.pending_restore = Some(ticket);
                    inner.state = BrowseState::Loading(LoadingPhase::Initial);
                }
                return Ok(outcome);
            }

            if query.char_len() <= self.settings.local_search_max_chars {
                let local = inner.cache.scan(&query);
                if !local.is_empty() {
                    debug!(
                        "Short query '{}' matched {} cached {} entities",
                        query.as_str(),
                        local.len(),
                        E::KIND
                    );
                    return Ok(inner.apply(local, ResultSource::LocalScan));
                }
            }

            if let Some(results) = precomputed {
                return Ok(inner.apply(results, ResultSource::Precomputed));
            }

            inner.state = BrowseState::Loading(LoadingPhase::Search);
            ticket
        };

        debug!("🔍 Remote {} search for '{}' ({})", E::KIND, query.as_str(), ticket);
        let result = self.gateway.search_by_query(&query).await;
        self.settle(ticket, result, "search").await
    }

    /// Replace the displayed list with the gateway's filtered list.
    pub async fn apply_filters(&self, criteria: &FilterCriteria) -> Result<BrowseOutcome, FetchError> {
        let ticket = {
            let mut inner = self.inner.write().await;
            inner.state = BrowseState::Loading(LoadingPhase::Filter);
            self.sequence.issue()
        };

        debug!(
            "Filtering {} entities on {} active group(s) ({})",
            E::KIND,
            criteria.active_groups().count(),
            ticket
        );
        let result = self.gateway.filter_by(criteria).await;
        self.settle(ticket, result, "filter").await
    }

    /// Move to `page` and request a scroll to the top. `page` is not clamped;
    /// out-of-range pages show an empty slice.
    pub async fn set_page(&self, page: usize) {
        self.inner.write().await.page.current_page = page;
        debug!("{} page -> {}", E::KIND, page);

        if let Some(sink) = &self.scroll_sink {
            sink.scroll_to_top(ScrollRequest { page, smooth: true });
        }
    }

    async fn settle(
        &self,
        ticket: RequestTicket,
        result: Result<Vec<E>, FetchError>,
        operation: &'static str,
    ) -> Result<BrowseOutcome, FetchError> {
        let mut inner = self.inner.write().await;
        match result {
            Ok(entries) => {
                if !self.sequence.is_latest(ticket) {
                    debug!("Discarding stale {} {} response {}", E::KIND, operation, ticket);
                    return Ok(BrowseOutcome::Superseded);
                }
                Ok(inner.apply(entries, ResultSource::Gateway))
            }
            Err(err) => {
                let current = self.sequence.is_latest(ticket);
                self.settle_failure(&mut inner, ticket, current, operation, err)
            }
        }
    }

    fn settle_failure(
        &self,
        inner: &mut BrowserInner<E>,
        ticket: RequestTicket,
        current: bool,
        operation: &'static str,
        err: FetchError,
    ) -> Result<BrowseOutcome, FetchError> {
        if !current {
            debug!("Ignoring stale {} {} failure {}: {}", E::KIND, operation, ticket, err);
            return Ok(BrowseOutcome::Superseded);
        }

        warn!("❌ {} {} failed: {}", E::KIND, operation, err);
        inner.state = BrowseState::Ready;
        inner.last_error = Some(err.clone());
        inner.pending_restore = None;
        Err(err)
    }

    /// Items on the current page.
    pub async fn displayed_slice(&self) -> Vec<E> {
        let inner = self.inner.read().await;
        inner.displayed[inner.page.bounds(inner.displayed.len())].to_vec()
    }

    /// Whole displayed list, across pages.
    pub async fn displayed(&self) -> Vec<E> {
        self.inner.read().await.displayed.clone()
    }

    pub async fn displayed_len(&self) -> usize {
        self.inner.read().await.displayed.len()
    }

    pub async fn current_page(&self) -> usize {
        self.inner.read().await.page.current_page
    }

    pub async fn total_pages(&self) -> usize {
        let inner = self.inner.read().await;
        inner.page.total_pages(inner.displayed.len())
    }

    pub async fn state(&self) -> BrowseState {
        self.inner.read().await.state
    }

    pub async fn last_error(&self) -> Option<FetchError> {
        self.inner.read().await.last_error.clone()
    }

    pub async fn is_cache_populated(&self) -> bool {
        self.inner.read().await.cache.is_populated()
    }

    pub async fn cached(&self) -> Vec<E> {
        self.inner.read().await.cache.snapshot()
    }

    pub async fn view(&self) -> BrowseView<E> {
        let inner = self.inner.read().await;
        let total_items = inner.displayed.len();
        let current_page = inner.page.current_page;
        let total_pages = inner.page.total_pages(total_items);

        BrowseView {
            kind: E::KIND,
            state: inner.state,
            current_page,
            page_size: inner.page.page_size,
            total_pages,
            total_items,
            items: inner.displayed[inner.page.bounds(total_items)].to_vec(),
            page_links: pagination::page_links(current_page, total_pages),
            has_previous: pagination::has_previous(current_page),
            has_next: pagination::has_next(current_page, total_pages),
            is_empty: total_items == 0 && inner.state == BrowseState::Ready,
            last_error: inner.last_error.as_ref().map(ToString::to_string),
        }
    }
}
