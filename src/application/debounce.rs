//! Live-search debouncing between keystrokes and [`CatalogBrowser::search`]
//!
//! Each input change cancels the pending timer and, depending on the new
//! text, either searches at once (field cleared), does nothing (too short)
//! or starts a fresh timer. Only the waiting phase is cancellable: a search
//! that has already started runs to completion, and the browser's request
//! sequence discards it if something newer was issued meanwhile.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::application::browser::{BrowseOutcome, CatalogBrowser};
use crate::domain::criteria::SearchQuery;
use crate::domain::entities::CatalogEntity;
use crate::domain::errors::FetchError;
use crate::domain::gateway::QueryGateway;
use crate::infrastructure::config::BrowsingConfig;

/// What an input change did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputAction {
    /// Field cleared; the full list is being restored now
    SearchedImmediately,
    /// Timer (re)started
    Scheduled,
    /// Too short to search
    Ignored,
    /// Live mode off; text kept for `submit`
    Buffered,
}

#[derive(Default)]
struct Pending {
    text: String,
    timer: Option<CancellationToken>,
    task: Option<JoinHandle<()>>,
}

pub struct LiveSearchDebouncer<E, G> {
    browser: Arc<CatalogBrowser<E, G>>,
    delay: Duration,
    min_chars: usize,
    live: bool,
    pending: Mutex<Pending>,
}

impl<E, G> LiveSearchDebouncer<E, G>
where
    E: CatalogEntity,
    G: QueryGateway<E> + 'static,
{
    pub fn new(browser: Arc<CatalogBrowser<E, G>>, settings: &BrowsingConfig) -> Self {
        Self {
            browser,
            delay: Duration::from_millis(settings.debounce_ms),
            min_chars: settings.live_search_min_chars,
            live: settings.live_search_enabled,
            pending: Mutex::new(Pending::default()),
        }
    }

    pub fn browser(&self) -> &Arc<CatalogBrowser<E, G>> {
        &self.browser
    }

    pub fn text(&self) -> String {
        self.lock().text.clone()
    }

    pub fn has_pending_timer(&self) -> bool {
        self.lock()
            .timer
            .as_ref()
            .is_some_and(|token| !token.is_cancelled())
    }

    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handle one input change. Must be called from within a Tokio runtime.
    pub fn on_input(&self, text: &str) -> InputAction {
        let mut pending = self.lock();
        pending.text = text.to_string();
        if let Some(token) = pending.timer.take() {
            token.cancel();
        }

        if !self.live {
            return InputAction::Buffered;
        }

        let query = SearchQuery::new(text);
        if query.is_blank() {
            let browser = Arc::clone(&self.browser);
            pending.task = Some(tokio::spawn(async move {
                if let Err(err) = browser.search("", None).await {
                    warn!("Clearing {} search failed: {}", E::KIND, err);
                }
            }));
            return InputAction::SearchedImmediately;
        }

        if query.char_len() < self.min_chars {
            return InputAction::Ignored;
        }

        let token = CancellationToken::new();
        let cancelled = token.clone();
        let browser = Arc::clone(&self.browser);
        let delay = self.delay;
        let text = query.as_str().to_string();

        pending.timer = Some(token);
        pending.task = Some(tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {
                    debug!("Debounced {} search for '{}' cancelled", E::KIND, text);
                }
                _ = tokio::time::sleep(delay) => {
                    if let Err(err) = browser.search(&text, None).await {
                        warn!("Live {} search for '{}' failed: {}", E::KIND, text, err);
                    }
                }
            }
        }));
        InputAction::Scheduled
    }

    /// Explicit form submission: cancel any pending timer and search the
    /// current text now.
    pub async fn submit(&self) -> Result<BrowseOutcome, FetchError> {
        let text = {
            let mut pending = self.lock();
            if let Some(token) = pending.timer.take() {
                token.cancel();
            }
            pending.text.clone()
        };
        self.browser.search(&text, None).await
    }

    pub fn cancel(&self) {
        if let Some(token) = self.lock().timer.take() {
            token.cancel();
        }
    }

    /// Wait for the most recently spawned search task, if any.
    pub async fn settle(&self) {
        let task = self.lock().task.take();
        if let Some(task) = task {
            if let Err(err) = task.await {
                warn!("Live search task ended abnormally: {}", err);
            }
        }
    }
}

impl<E, G> Drop for LiveSearchDebouncer<E, G> {
    fn drop(&mut self) {
        let pending = self.pending.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(token) = pending.timer.take() {
            token.cancel();
        }
    }
}
