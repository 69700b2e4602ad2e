//! SearchSession - result aggregation and pagination for the host UI
//!
//! A session holds one search at a time: the query and filters, every excerpt
//! loaded so far, the backend's total and the last backend page fetched.
//! `start_search` replaces all of it; `load_more` appends the next page.
//!
//! Async Cancellation Architecture:
//! Every `start_search` bumps a generation number and cancels the previous
//! search's CancellationToken. A fetch finishing for an older generation is
//! discarded with `Superseded`. When the host drops a pending call, UniFFI
//! drops the Rust future, and a DropGuard cancels that call's token.
//! State sits behind a mutex that is never held across an await.

use crate::backend::{HttpBackend, SearchBackend, SearchRequest};
use crate::config::ClientConfig;
use crate::interface::{
    BeytError, FullPoem, LoadOutcome, PoetDetails, PoetEntry, SearchExcerpt, SessionSnapshot,
};
use crate::models::{SearchPage, VerseRecord};
use crate::poets::PoetDirectory;
use crate::transform::{build_excerpt, build_full_poem};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Results requested per backend page
pub const PAGE_SIZE: u32 = 50;

/// Global fallback Tokio runtime for when async functions are called outside any runtime context.
/// Shared by every session and never dropped.
static FALLBACK_RUNTIME: Lazy<tokio::runtime::Runtime> = Lazy::new(|| {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .expect("Failed to create fallback tokio runtime")
});

fn runtime_handle() -> tokio::runtime::Handle {
    tokio::runtime::Handle::try_current().unwrap_or_else(|_| FALLBACK_RUNTIME.handle().clone())
}

/// RAII guard that cancels a token when dropped.
struct DropGuard {
    token: CancellationToken,
}

impl DropGuard {
    fn new(token: CancellationToken) -> Self {
        Self { token }
    }
}

impl Drop for DropGuard {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Clears the fetching flag on every exit path, unless a newer search owns it
struct FetchGuard<'a> {
    state: &'a Mutex<SessionState>,
    generation: u64,
}

impl Drop for FetchGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock();
        if state.generation == self.generation {
            state.is_fetching_more = false;
        }
    }
}

#[derive(Default)]
struct SessionState {
    active: bool,
    query: String,
    poet_names: Vec<String>,
    liked_only: bool,
    excerpts: Vec<SearchExcerpt>,
    total: u64,
    /// Last backend page loaded successfully; 0 before the first one
    backend_page: u32,
    cursor: usize,
    is_fetching_more: bool,
    generation: u64,
    token: CancellationToken,
}

impl SessionState {
    fn can_load_more(&self) -> bool {
        (self.excerpts.len() as u64) < self.total
    }

    fn request(&self, page: u32) -> SearchRequest {
        SearchRequest {
            query: self.query.clone(),
            poet_names: self.poet_names.clone(),
            liked_only: self.liked_only,
            page,
            limit: PAGE_SIZE,
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            query: self.query.clone(),
            poet_names: self.poet_names.clone(),
            liked_only: self.liked_only,
            loaded_count: self.excerpts.len() as u64,
            total_count: self.total,
            backend_page: self.backend_page,
            cursor: self.cursor as u64,
            is_fetching_more: self.is_fetching_more,
        }
    }
}

#[derive(uniffi::Object)]
pub struct SearchSession {
    backend: Arc<dyn SearchBackend>,
    state: Mutex<SessionState>,
    poets: Mutex<Option<PoetDirectory>>,
}

// Internal implementation (not exported via FFI)
impl SearchSession {
    pub fn with_backend(backend: Arc<dyn SearchBackend>) -> Self {
        Self {
            backend,
            state: Mutex::new(SessionState::default()),
            poets: Mutex::new(None),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, BeytError> {
        Ok(Self::with_backend(Arc::new(HttpBackend::new(config)?)))
    }

    /// Run a backend call on the runtime, aborting when `token` is cancelled
    async fn run<T, F>(token: CancellationToken, fut: F) -> Result<T, BeytError>
    where
        T: Send + 'static,
        F: Future<Output = Result<T, BeytError>> + Send + 'static,
    {
        let handle = runtime_handle().spawn(async move {
            tokio::select! {
                _ = token.cancelled() => Err(BeytError::Cancelled),
                result = fut => result,
            }
        });

        match handle.await {
            Ok(result) => result,
            Err(e) if e.is_cancelled() => Err(BeytError::Cancelled),
            Err(e) => Err(BeytError::Network(format!("fetch task failed: {e}"))),
        }
    }

    async fn fetch_page(
        &self,
        token: CancellationToken,
        request: SearchRequest,
    ) -> Result<SearchPage, BeytError> {
        let call_token = token.child_token();
        let _guard = DropGuard::new(call_token.clone());
        let backend = Arc::clone(&self.backend);
        Self::run(call_token, async move { backend.search(&request).await }).await
    }

    fn build_excerpts(&self, records: &[VerseRecord]) -> Vec<SearchExcerpt> {
        let poets = self.poets.lock();
        records
            .iter()
            .map(|record| {
                let poet_id = poets.as_ref().and_then(|dir| dir.id_for(&record.poet));
                build_excerpt(record, poet_id)
            })
            .collect()
    }
}

#[uniffi::export]
impl SearchSession {
    /// Create a session against the REST API at `base_url`
    #[uniffi::constructor]
    pub fn new(base_url: String) -> Result<Self, BeytError> {
        Self::from_config(&ClientConfig::new(base_url))
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Backend-driven operations
    // ─────────────────────────────────────────────────────────────────────────

    /// Discard everything loaded so far and fetch the first page of a new search.
    /// On failure the session is left empty.
    pub async fn start_search(
        &self,
        query: String,
        poet_names: Vec<String>,
        liked_only: bool,
    ) -> Result<SessionSnapshot, BeytError> {
        let (generation, token, request) = {
            let mut state = self.state.lock();
            state.token.cancel();
            let generation = state.generation + 1;
            *state = SessionState {
                active: true,
                query,
                poet_names,
                liked_only,
                is_fetching_more: true,
                generation,
                ..SessionState::default()
            };
            (generation, state.token.clone(), state.request(1))
        };
        let _fetching = FetchGuard {
            state: &self.state,
            generation,
        };

        let result = self.fetch_page(token, request).await;
        let built = result.map(|page| {
            let excerpts = self.build_excerpts(&page.records);
            (excerpts, page.total)
        });

        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(generation, "Discarding first page of a replaced search");
            return Err(BeytError::Superseded);
        }
        let (excerpts, total) = built.map_err(|e| {
            warn!(query = %state.query, "Search failed: {e}");
            e
        })?;

        state.total = total.unwrap_or(excerpts.len() as u64);
        state.excerpts = excerpts;
        state.backend_page = 1;
        state.is_fetching_more = false;
        info!(
            query = %state.query,
            loaded = state.excerpts.len(),
            total = state.total,
            "Search loaded"
        );
        Ok(state.snapshot())
    }

    /// Fetch the next backend page and append its excerpts.
    /// Concurrent calls collapse into one request.
    pub async fn load_more(&self) -> Result<LoadOutcome, BeytError> {
        let (generation, token, request) = {
            let mut state = self.state.lock();
            if !state.active {
                return Err(BeytError::InvalidInput("no search has been started".into()));
            }
            if state.is_fetching_more {
                return Ok(LoadOutcome::AlreadyLoading);
            }
            if !state.can_load_more() {
                return Ok(LoadOutcome::Exhausted);
            }
            state.is_fetching_more = true;
            let page = state.backend_page + 1;
            (state.generation, state.token.clone(), state.request(page))
        };
        let _fetching = FetchGuard {
            state: &self.state,
            generation,
        };

        let page_number = request.page;
        let result = self.fetch_page(token, request).await;
        let built = result.map(|page| {
            let excerpts = self.build_excerpts(&page.records);
            (excerpts, page.total)
        });

        let mut state = self.state.lock();
        if state.generation != generation {
            debug!(generation, page = page_number, "Discarding page of a replaced search");
            return Err(BeytError::Superseded);
        }
        let (excerpts, total) = built.map_err(|e| {
            warn!(page = page_number, "Loading more results failed: {e}");
            e
        })?;

        let count = excerpts.len() as u64;
        state.excerpts.extend(excerpts);
        let loaded = state.excerpts.len() as u64;
        state.total = total.unwrap_or(state.total).max(loaded);
        state.backend_page = page_number;
        state.is_fetching_more = false;
        debug!(page = page_number, count, loaded, "Appended page");
        Ok(LoadOutcome::Appended { count })
    }

    /// Fetch the poet list; later excerpts carry the positional poet ids
    pub async fn load_poets(&self) -> Result<Vec<PoetEntry>, BeytError> {
        let token = CancellationToken::new();
        let _guard = DropGuard::new(token.clone());
        let backend = Arc::clone(&self.backend);
        let names = Self::run(token, async move { backend.poets().await }).await?;

        let directory = PoetDirectory::from_names(names);
        let entries = directory.entries().to_vec();
        info!(count = entries.len(), "Loaded poet directory");
        *self.poets.lock() = Some(directory);
        Ok(entries)
    }

    /// Fetch one poem and render every line of it
    pub async fn fetch_poem(&self, poem_id: i64) -> Result<FullPoem, BeytError> {
        let token = CancellationToken::new();
        let _guard = DropGuard::new(token.clone());
        let backend = Arc::clone(&self.backend);
        let record = Self::run(token, async move { backend.poem(poem_id).await }).await?;
        Ok(build_full_poem(&record))
    }

    /// Fetch a poet's detail page. A blank name is filled in from the loaded
    /// poet directory.
    pub async fn fetch_poet(&self, poet_id: u64) -> Result<PoetDetails, BeytError> {
        let token = CancellationToken::new();
        let _guard = DropGuard::new(token.clone());
        let backend = Arc::clone(&self.backend);
        let record = Self::run(token, async move { backend.poet(poet_id).await }).await?;

        let name = if record.name.trim().is_empty() {
            self.poets
                .lock()
                .as_ref()
                .and_then(|dir| dir.name_for(poet_id))
                .map(str::to_string)
                .unwrap_or_default()
        } else {
            record.name
        };

        Ok(PoetDetails {
            poet_id,
            name,
            description: record.description,
            details_json: record.raw,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Local state
    // ─────────────────────────────────────────────────────────────────────────

    /// Translate poet ids picked in the UI into filter names for `start_search`
    pub fn poet_names_for(&self, poet_ids: Vec<u64>) -> Vec<String> {
        match self.poets.lock().as_ref() {
            Some(directory) => directory.names_for(&poet_ids),
            None => Vec::new(),
        }
    }

    pub fn can_load_more(&self) -> bool {
        self.state.lock().can_load_more()
    }

    /// Step to the next loaded excerpt. Never fetches: at the last loaded
    /// excerpt this returns false even if `can_load_more` is true.
    pub fn advance(&self) -> bool {
        let mut state = self.state.lock();
        if state.cursor + 1 < state.excerpts.len() {
            state.cursor += 1;
            true
        } else {
            false
        }
    }

    pub fn retreat(&self) -> bool {
        let mut state = self.state.lock();
        if state.cursor > 0 {
            state.cursor -= 1;
            true
        } else {
            false
        }
    }

    pub fn current(&self) -> Option<SearchExcerpt> {
        let state = self.state.lock();
        state.excerpts.get(state.cursor).cloned()
    }

    pub fn excerpts(&self) -> Vec<SearchExcerpt> {
        self.state.lock().excerpts.clone()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.lock().snapshot()
    }
}
