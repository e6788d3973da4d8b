//! Request-level cache for catalog pages.
//!
//! Memoizes completed page requests by normalized key for a TTL window and
//! coalesces concurrent identical requests into one underlying fetch.
//! Constructed explicitly and injected; `invalidate` resets it.

mod key;

pub use key::{CacheEntry, PageRequestKey};

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::catalog::{CatalogError, ListingPage};
use crate::metrics;

/// Request shape handed to a loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestShape {
    /// The request as keyed, including its field projection.
    Primary,
    /// Retry shape without the optional field projection.
    WithoutProjection,
}

/// Outcome shared by every waiter of one fetch.
pub type FetchResult = Result<Arc<CacheEntry>, CatalogError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

struct InFlight {
    generation: u64,
    fetch: SharedFetch,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<PageRequestKey, Arc<CacheEntry>>,
    in_flight: HashMap<PageRequestKey, InFlight>,
    /// Bumped by `invalidate`; fetches started under an older generation
    /// do not populate the cache.
    generation: u64,
}

struct CacheInner {
    ttl: Duration,
    state: Mutex<CacheState>,
}

/// Page request cache with in-flight coalescing.
///
/// Clones share the same underlying state.
#[derive(Clone)]
pub struct RequestCache {
    inner: Arc<CacheInner>,
}

impl std::fmt::Debug for RequestCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestCache")
            .field("ttl", &self.inner.ttl)
            .field("state", &"<state>")
            .finish()
    }
}

impl RequestCache {
    /// Default freshness window.
    pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                ttl,
                state: Mutex::new(CacheState::default()),
            }),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.inner.ttl
    }

    /// Fresh entry for `key`, if any.
    pub async fn get(&self, key: &PageRequestKey) -> Option<Arc<CacheEntry>> {
        let state = self.inner.state.lock().await;
        state
            .entries
            .get(key)
            .filter(|e| e.is_fresh(self.inner.ttl))
            .cloned()
    }

    /// Return a fresh entry, join an identical in-flight request, or fetch.
    ///
    /// `loader` is called with `RequestShape::Primary` first; if that fails
    /// it is called exactly once more with `RequestShape::WithoutProjection`.
    /// Whichever shape succeeds, the result is stored under `key`. When both
    /// fail every waiter receives the error and nothing is cached.
    pub async fn fetch_or_coalesce<F, Fut>(&self, key: PageRequestKey, loader: F) -> FetchResult
    where
        F: Fn(RequestShape) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ListingPage, CatalogError>> + Send + 'static,
    {
        let fetch = {
            let mut state = self.inner.state.lock().await;

            if let Some(entry) = state.entries.get(&key) {
                if entry.is_fresh(self.inner.ttl) {
                    metrics::CACHE_LOOKUPS.with_label_values(&["hit"]).inc();
                    return Ok(Arc::clone(entry));
                }
            }

            if let Some(in_flight) = state.in_flight.get(&key) {
                metrics::CACHE_LOOKUPS.with_label_values(&["coalesced"]).inc();
                debug!(?key, "Joining in-flight request");
                in_flight.fetch.clone()
            } else {
                metrics::CACHE_LOOKUPS.with_label_values(&["miss"]).inc();
                let generation = state.generation;
                let fetch = run_fetch(Arc::clone(&self.inner), key.clone(), generation, loader)
                    .boxed()
                    .shared();
                state.in_flight.insert(
                    key,
                    InFlight {
                        generation,
                        fetch: fetch.clone(),
                    },
                );
                fetch
            }
        };

        fetch.await
    }

    /// Drop every entry and forget in-flight requests.
    pub async fn invalidate(&self) {
        let mut state = self.inner.state.lock().await;
        state.generation += 1;
        state.entries.clear();
        state.in_flight.clear();
        debug!(generation = state.generation, "Request cache invalidated");
    }

    /// Number of stored entries, fresh or not.
    pub async fn len(&self) -> usize {
        self.inner.state.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl Default for RequestCache {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TTL)
    }
}

async fn run_fetch<F, Fut>(
    inner: Arc<CacheInner>,
    key: PageRequestKey,
    generation: u64,
    loader: F,
) -> FetchResult
where
    F: Fn(RequestShape) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ListingPage, CatalogError>> + Send + 'static,
{
    let result = match loader(RequestShape::Primary).await {
        Ok(page) => Ok(page),
        Err(e) => {
            warn!(?key, error = %e, "Primary request failed, retrying without projection");
            metrics::FALLBACKS
                .with_label_values(&["without_projection"])
                .inc();
            loader(RequestShape::WithoutProjection).await
        }
    };

    let mut state = inner.state.lock().await;
    let owns_slot = state
        .in_flight
        .get(&key)
        .map(|f| f.generation == generation)
        .unwrap_or(false);
    if owns_slot {
        state.in_flight.remove(&key);
    }

    let page = result.map_err(|e| {
        warn!(?key, error = %e, "Request failed after retry");
        e
    })?;

    let entry = Arc::new(CacheEntry {
        key: key.clone(),
        fetched_at: Instant::now(),
        total: page.total,
        items: page.items,
        received: page.received,
    });

    if state.generation == generation {
        state.entries.insert(key, Arc::clone(&entry));
    } else {
        debug!(?key, "Cache invalidated during fetch, not storing");
    }

    Ok(entry)
}
