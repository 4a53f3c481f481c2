//! Search controller for the patent listing.
//!
//! Owns the query string and the result list, and coordinates the
//! debounced fetch lifecycle against a [`SearchBackend`]. Two rules keep
//! rapid typing sane:
//!
//! - only the most recent schedule inside the debounce window fires;
//!   superseded schedules are cancelled outright;
//! - every issued fetch carries an epoch number, and a response is
//!   applied only while its epoch is still the latest issued. A slow
//!   early request can complete, but it can never overwrite the results
//!   of a later one ("last query wins").
//!
//! There is no network-level cancellation; superseded requests finish
//! and their responses are discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::debounce::DebounceTimer;
use crate::error::Result;
use crate::models::PatentSummary;

/// Delay between the last keystroke and the fetch it triggers.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchStatus {
    /// Nothing fetched yet.
    Idle,
    /// A request is in flight.
    Loading,
    /// The last accepted fetch failed; see `error_message`.
    Error,
    /// `results` reflect the last accepted response.
    Ready,
}

#[derive(Debug, Clone)]
pub struct SearchState {
    pub query: String,
    pub results: Vec<PatentSummary>,
    pub status: SearchStatus,
    pub error_message: Option<String>,
}

impl Default for SearchState {
    fn default() -> Self {
        Self {
            query: String::new(),
            results: Vec::new(),
            status: SearchStatus::Idle,
            error_message: None,
        }
    }
}

/// The seam between the controller and the HTTP client; mocked in tests.
#[async_trait]
pub trait SearchBackend: Send + Sync + 'static {
    /// Fetch the records matching `query`; empty means "all records".
    async fn search(&self, query: &str) -> Result<Vec<PatentSummary>>;
}

#[async_trait]
impl<B: SearchBackend + ?Sized> SearchBackend for Arc<B> {
    async fn search(&self, query: &str) -> Result<Vec<PatentSummary>> {
        (**self).search(query).await
    }
}

struct ControllerInner<B> {
    backend: B,
    state: Mutex<SearchState>,
    /// Highest epoch issued so far; fetch results older than this are stale.
    epoch: AtomicU64,
}

impl<B: SearchBackend> ControllerInner<B> {
    async fn fetch(&self, query: &str) {
        let epoch = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        {
            let mut state = self.state.lock().unwrap();
            state.status = SearchStatus::Loading;
            state.error_message = None;
        }
        debug!(epoch, query, "issuing search");

        let outcome = self.backend.search(query).await;

        // The staleness check happens under the state lock: a newer
        // fetch bumps the epoch before it can touch the state, so a
        // response that passes the check here cannot be overtaken
        // between the check and the apply.
        let mut state = self.state.lock().unwrap();
        if self.epoch.load(Ordering::SeqCst) != epoch {
            debug!(epoch, "discarding superseded search response");
            return;
        }

        match outcome {
            Ok(results) => {
                debug!(epoch, count = results.len(), "search applied");
                state.results = results;
                state.status = SearchStatus::Ready;
                state.error_message = None;
            }
            Err(e) => {
                warn!(epoch, query, "search failed: {e}");
                state.results.clear();
                state.status = SearchStatus::Error;
                state.error_message = Some(e.summary());
            }
        }
    }
}

pub struct SearchController<B: SearchBackend> {
    inner: Arc<ControllerInner<B>>,
    delay: Duration,
    timer: Mutex<Option<DebounceTimer>>,
}

impl<B: SearchBackend> SearchController<B> {
    pub fn new(backend: B, delay: Duration) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                backend,
                state: Mutex::new(SearchState::default()),
                epoch: AtomicU64::new(0),
            }),
            delay,
            timer: Mutex::new(None),
        }
    }

    pub fn with_default_delay(backend: B) -> Self {
        Self::new(backend, DEFAULT_DEBOUNCE)
    }

    /// Record a keystroke: echo the query immediately and (re)schedule
    /// the debounced fetch. A schedule superseded within the window
    /// never fires.
    pub fn set_query(&self, text: &str) {
        {
            let mut state = self.inner.state.lock().unwrap();
            state.query = text.to_string();
        }

        let mut slot = self.timer.lock().unwrap();
        if let Some(old) = slot.take() {
            old.cancel();
        }
        let inner = self.inner.clone();
        let query = text.to_string();
        *slot = Some(DebounceTimer::schedule(self.delay, async move {
            inner.fetch(&query).await;
        }));
    }

    /// Populate the full list on first mount, bypassing the debounce.
    pub fn initial_load(&self) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            inner.fetch("").await;
        });
    }

    /// Fetch `query` right now and wait for the outcome to be applied
    /// (or discarded, if something newer was issued meanwhile).
    pub async fn search_now(&self, query: &str) {
        self.cancel_pending();
        {
            let mut state = self.inner.state.lock().unwrap();
            state.query = query.to_string();
        }
        self.inner.fetch(query).await;
    }

    /// Cancel any pending debounced fetch. In-flight requests are not
    /// interrupted; their responses fall to the epoch guard.
    pub fn cancel_pending(&self) {
        if let Some(timer) = self.timer.lock().unwrap().take() {
            timer.cancel();
        }
    }

    /// Whether a debounced fetch is scheduled but has not fired yet.
    pub fn has_pending_fetch(&self) -> bool {
        self.timer
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(DebounceTimer::is_pending)
    }

    /// Copy of the current state for rendering.
    pub fn snapshot(&self) -> SearchState {
        self.inner.state.lock().unwrap().clone()
    }
}

impl<B: SearchBackend> Drop for SearchController<B> {
    // Tearing the controller down must not leave a timer that fires
    // into a disposed view.
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
