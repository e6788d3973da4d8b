//! Page loader and mode controller.
//!
//! Drives two loading strategies and switches between them on every input:
//! - Local: load a small initial window, stream the rest of the catalog in
//!   the background into a deduplicated `ListingStore`, filter in memory.
//! - Server: ask the API for each page (debounced for typing), keep only
//!   the newest response.
//!
//! Both modes go through the shared `RequestCache` and the same
//! deduplication and filter pipeline before a `CatalogView` is produced.

mod local;
mod server;
mod store;
mod types;

pub use store::ListingStore;
pub use types::{BrowseCriteria, CatalogView, LoaderMode, Refinements};

use std::sync::atomic::AtomicU64;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cache::{CacheEntry, PageRequestKey, RequestCache, RequestShape};
use crate::catalog::{CatalogApi, CatalogError, ListingQuery, RequestRoute};
use crate::config::LoaderConfig;
use crate::filter::{self, SortKey, SortOrder};
use crate::listing::Listing;
use crate::taxonomy::{self, CategorySlug};

/// A spawned loader task and the token that stops it.
struct TaskHandle {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl TaskHandle {
    fn cancel(&self) {
        self.token.cancel();
    }

    fn is_running(&self) -> bool {
        !self.handle.is_finished() && !self.token.is_cancelled()
    }

    fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

/// How often `wait_idle` checks on running tasks.
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(5);

#[derive(Default)]
struct Tasks {
    background: Option<TaskHandle>,
    server: Option<TaskHandle>,
}

/// Authoritative page returned in Server mode.
struct ServerPage {
    items: Vec<Listing>,
    total: u64,
    /// 1-based page the items belong to.
    page: u32,
}

struct LoaderState {
    mode: LoaderMode,
    criteria: BrowseCriteria,
    store: ListingStore,
    initial_loaded: bool,
    initial_loading: bool,
    server_page: Option<ServerPage>,
    server_loading: bool,
    /// Counts from the distinct-categories endpoint, when loaded.
    categories: Option<Vec<CategorySlug>>,
    error: Option<String>,
}

/// How an input change affects Server mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputKind {
    /// Query text or category: debounced request.
    Search,
    /// Page number or size: immediate request.
    Paging,
    /// Refinements and sorting: applied to data already held.
    ClientOnly,
}

struct LoaderShared {
    api: Arc<dyn CatalogApi>,
    cache: RequestCache,
    config: LoaderConfig,
    state: RwLock<LoaderState>,
    /// Number of the newest Server-mode request; older results are dropped.
    sequence: AtomicU64,
    shutdown: CancellationToken,
    tasks: Mutex<Tasks>,
}

/// Catalog page loader.
///
/// Dropping the loader cancels its background work.
pub struct PageLoader {
    shared: Arc<LoaderShared>,
}

impl std::fmt::Debug for PageLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageLoader")
            .field("api", &self.shared.api.name())
            .field("cache", &self.shared.cache)
            .field("config", &self.shared.config)
            .finish()
    }
}

impl PageLoader {
    pub fn new(api: Arc<dyn CatalogApi>, cache: RequestCache, mut config: LoaderConfig) -> Self {
        config.initial_batch_size = config.initial_batch_size.max(1);
        config.batch_size = config.batch_size.max(1);
        let criteria = BrowseCriteria::new(config.page_size);
        let state = LoaderState {
            mode: LoaderMode::for_criteria(&criteria),
            criteria,
            store: ListingStore::new(),
            initial_loaded: false,
            initial_loading: false,
            server_page: None,
            server_loading: false,
            categories: None,
            error: None,
        };

        Self {
            shared: Arc::new(LoaderShared {
                api,
                cache,
                config,
                state: RwLock::new(state),
                sequence: AtomicU64::new(0),
                shutdown: CancellationToken::new(),
                tasks: Mutex::new(Tasks::default()),
            }),
        }
    }

    /// Load the first view.
    ///
    /// In Local mode this returns as soon as the initial window is merged;
    /// the rest of the catalog streams in afterwards.
    pub async fn start(&self) -> CatalogView {
        let mode = self.mode().await;
        match mode {
            LoaderMode::Local => {
                let needs_background = self.shared.prepare_local().await;
                let view = self.view().await;
                if needs_background {
                    self.shared.spawn_background().await;
                }
                view
            }
            LoaderMode::Server => {
                self.shared.schedule_server(None).await;
                self.view().await
            }
        }
    }

    pub async fn mode(&self) -> LoaderMode {
        self.shared.state.read().await.mode
    }

    pub async fn criteria(&self) -> BrowseCriteria {
        self.shared.state.read().await.criteria.clone()
    }

    /// Set the free-text query. Returns the mode now in effect.
    pub async fn set_query(&self, query: impl Into<String>) -> LoaderMode {
        let query = query.into();
        self.update(InputKind::Search, move |c| {
            c.query = query;
            c.page = 1;
        })
        .await
    }

    /// Set the category slug; `None` or "todos" selects everything.
    pub async fn set_category(&self, slug: Option<String>) -> LoaderMode {
        self.update(InputKind::Search, move |c| {
            c.category = slug.filter(|s| !taxonomy::is_all(Some(s)));
            c.page = 1;
        })
        .await
    }

    pub async fn set_filter(&self, refinements: Refinements) -> LoaderMode {
        self.update(InputKind::ClientOnly, move |c| {
            c.refinements = refinements;
            c.page = 1;
        })
        .await
    }

    pub async fn set_sort(&self, key: SortKey, order: SortOrder) -> LoaderMode {
        self.update(InputKind::ClientOnly, move |c| {
            c.sort_key = key;
            c.sort_order = order;
        })
        .await
    }

    /// Go to a 1-based page.
    pub async fn set_page(&self, page: u32) -> LoaderMode {
        self.update(InputKind::Paging, move |c| c.page = page.max(1))
            .await
    }

    pub async fn set_page_size(&self, page_size: u32) -> LoaderMode {
        self.update(InputKind::Paging, move |c| {
            c.page_size = page_size.max(1);
            c.page = 1;
        })
        .await
    }

    /// Retry after a failure without dropping cached data.
    pub async fn retry(&self) {
        let mode = self.mode().await;
        match mode {
            LoaderMode::Local => {
                if self.shared.prepare_local().await {
                    self.shared.spawn_background().await;
                }
            }
            LoaderMode::Server => self.shared.schedule_server(None).await,
        }
    }

    /// Invalidate the cache and reload the current mode from scratch.
    ///
    /// The previous items stay visible until the reload succeeds.
    pub async fn refresh(&self) {
        self.shared.cache.invalidate().await;
        self.shared.cancel_background().await;

        let mode = self.mode().await;
        match mode {
            LoaderMode::Local => {
                if self.shared.load_initial().await {
                    self.shared.spawn_background().await;
                }
            }
            LoaderMode::Server => self.shared.schedule_server(None).await,
        }
    }

    /// Fetch global category counts for the category menu.
    ///
    /// Once loaded they replace the counts derived from the local store.
    pub async fn load_categories(&self) -> Result<Vec<CategorySlug>, CatalogError> {
        let categories = taxonomy::load_category_counts(self.shared.api.as_ref()).await?;
        self.shared.state.write().await.categories = Some(categories.clone());
        Ok(categories)
    }

    /// Current snapshot for the view layer.
    pub async fn view(&self) -> CatalogView {
        self.shared.view().await
    }

    /// Wait until background streaming and pending requests have finished.
    ///
    /// Task handles stay registered while waiting, so inputs arriving in
    /// the meantime can still cancel them.
    pub async fn wait_idle(&self) {
        loop {
            let busy = {
                let tasks = self.shared.tasks.lock().await;
                let busy = [&tasks.background, &tasks.server]
                    .into_iter()
                    .flatten()
                    .any(|task| !task.is_finished());
                busy
            };
            if !busy {
                return;
            }
            tokio::time::sleep(IDLE_POLL_INTERVAL).await;
        }
    }

    /// Cancel every background task. Idempotent.
    pub fn shutdown(&self) {
        self.shared.shutdown.cancel();
    }

    async fn update<F>(&self, kind: InputKind, change: F) -> LoaderMode
    where
        F: FnOnce(&mut BrowseCriteria) + Send,
    {
        let (previous, current) = {
            let mut state = self.shared.state.write().await;
            change(&mut state.criteria);
            let previous = state.mode;
            state.mode = LoaderMode::for_criteria(&state.criteria);
            (previous, state.mode)
        };

        if previous != current {
            info!(from = ?previous, to = ?current, "Loader mode changed");
        }
        self.shared.after_input(previous, current, kind).await;
        current
    }
}

impl Drop for PageLoader {
    fn drop(&mut self) {
        self.shared.shutdown.cancel();
    }
}

impl LoaderShared {
    async fn after_input(self: &Arc<Self>, previous: LoaderMode, current: LoaderMode, kind: InputKind) {
        match (previous, current) {
            (LoaderMode::Local, LoaderMode::Server) => {
                self.cancel_background().await;
                if kind != InputKind::ClientOnly {
                    self.schedule_server(self.delay_for(kind)).await;
                }
            }
            (LoaderMode::Server, LoaderMode::Server) => {
                if kind != InputKind::ClientOnly {
                    self.schedule_server(self.delay_for(kind)).await;
                }
            }
            (LoaderMode::Server, LoaderMode::Local) => {
                self.leave_server().await;
                if self.prepare_local().await {
                    self.spawn_background().await;
                }
            }
            (LoaderMode::Local, LoaderMode::Local) => {}
        }
    }

    fn delay_for(&self, kind: InputKind) -> Option<std::time::Duration> {
        match kind {
            InputKind::Search => Some(self.config.debounce()),
            InputKind::Paging | InputKind::ClientOnly => None,
        }
    }

    /// Fetch one page through the request cache.
    async fn fetch_page(
        &self,
        route: RequestRoute,
        query: ListingQuery,
    ) -> Result<Arc<CacheEntry>, CatalogError> {
        let key = PageRequestKey::from_query(route, &query);
        let api = Arc::clone(&self.api);

        self.cache
            .fetch_or_coalesce(key, move |shape| {
                let api = Arc::clone(&api);
                let query = match shape {
                    RequestShape::Primary => query.clone(),
                    RequestShape::WithoutProjection => query.without_projection(),
                };
                async move { api.fetch_route(route, &query).await }
            })
            .await
    }

    async fn view(&self) -> CatalogView {
        let state = self.state.read().await;
        let criteria = &state.criteria;

        let categories = state
            .categories
            .clone()
            .unwrap_or_else(|| taxonomy::aggregate_counts(state.store.listings()));

        let (items, total, page, total_pages, loading) = match (state.mode, &state.server_page) {
            (LoaderMode::Server, Some(server_page)) => {
                let items = filter::apply(
                    &server_page.items,
                    &criteria.server_filter(),
                    criteria.sort_key,
                    criteria.sort_order,
                );
                // the page number travels with its data, so a failed page
                // change keeps reporting the page on screen
                (
                    items,
                    server_page.total,
                    server_page.page,
                    filter::total_pages(server_page.total, criteria.page_size),
                    state.server_loading,
                )
            }
            // Local mode, or Server mode before its first response: filter
            // what is already in memory.
            (mode, _) => {
                let filtered = filter::apply(
                    state.store.listings(),
                    &criteria.local_filter(),
                    criteria.sort_key,
                    criteria.sort_order,
                );
                let window = filter::paginate(&filtered, criteria.page, criteria.page_size);
                let loading = state.initial_loading
                    || (mode == LoaderMode::Server && state.server_loading);
                (window.items, window.total, window.page, window.total_pages, loading)
            }
        };

        debug!(mode = ?state.mode, items = items.len(), total, "View computed");

        CatalogView {
            mode: state.mode,
            items,
            total,
            page,
            page_size: criteria.page_size,
            total_pages,
            loading,
            background_complete: state.store.is_exhausted(),
            loaded_count: state.store.len(),
            error: state.error.clone(),
            categories,
        }
    }
}
