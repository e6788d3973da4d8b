//! Mock catalog API for testing.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::catalog::{
    CatalogApi, CatalogError, CategoryCountFlags, DistinctCategory, ListingPage, ListingQuery,
    RequestRoute,
};
use crate::filter::fold_text;
use crate::listing::Listing;

/// A recorded page request for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub route: RequestRoute,
    pub query: ListingQuery,
    /// When the request was made (tokio clock, so paused tests see it too).
    pub timestamp: tokio::time::Instant,
}

/// Mock implementation of the CatalogApi trait.
///
/// Serves pages out of an in-memory dataset the way the real API does:
/// - status, free text (case and accent insensitive) and category ids filter
/// - `offset`/`limit` slice, `total` is the filtered count
///
/// Failures, delays and an empty by-category route can be injected, and
/// every request is recorded.
///
/// # Example
///
/// ```rust,ignore
/// use vitrina_core::testing::{fixtures, MockCatalogApi};
///
/// let api = MockCatalogApi::with_listings(fixtures::catalog(100));
/// api.fail_next(1, CatalogError::Timeout).await;
///
/// let page = api.fetch_listings(&ListingQuery::page(10, 0)).await;
/// assert!(page.is_err());
/// assert_eq!(api.request_count().await, 1);
/// ```
pub struct MockCatalogApi {
    listings: Arc<RwLock<Vec<Listing>>>,
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
    /// Errors returned by the next page requests, in order.
    failures: Arc<RwLock<VecDeque<CatalogError>>>,
    /// Fail every request that carries a field projection.
    reject_projection: Arc<RwLock<bool>>,
    delay: Arc<RwLock<Option<Duration>>>,
    /// Extra latency keyed by folded query text.
    query_delays: Arc<RwLock<HashMap<String, Duration>>>,
    by_category_empty: Arc<RwLock<bool>>,
    distinct: Arc<RwLock<HashMap<CategoryCountFlags, Vec<DistinctCategory>>>>,
    distinct_calls: Arc<RwLock<Vec<CategoryCountFlags>>>,
}

impl std::fmt::Debug for MockCatalogApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockCatalogApi")
            .field("listings", &"<listings>")
            .field("requests", &"<requests>")
            .field("failures", &"<failures>")
            .field("delay", &"<delay>")
            .field("distinct", &"<distinct>")
            .finish()
    }
}

impl Default for MockCatalogApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockCatalogApi {
    /// Create a mock with an empty catalog.
    pub fn new() -> Self {
        Self::with_listings(Vec::new())
    }

    /// Create a mock serving the given listings.
    pub fn with_listings(listings: Vec<Listing>) -> Self {
        Self {
            listings: Arc::new(RwLock::new(listings)),
            requests: Arc::new(RwLock::new(Vec::new())),
            failures: Arc::new(RwLock::new(VecDeque::new())),
            reject_projection: Arc::new(RwLock::new(false)),
            delay: Arc::new(RwLock::new(None)),
            query_delays: Arc::new(RwLock::new(HashMap::new())),
            by_category_empty: Arc::new(RwLock::new(false)),
            distinct: Arc::new(RwLock::new(HashMap::new())),
            distinct_calls: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Make the next `count` page requests fail with `error`.
    pub async fn fail_next(&self, count: usize, error: CatalogError) {
        let mut failures = self.failures.write().await;
        for _ in 0..count {
            failures.push_back(error.clone());
        }
    }

    /// Reject projected requests, forcing the full-shape retry.
    pub async fn set_reject_projection(&self, reject: bool) {
        *self.reject_projection.write().await = reject;
    }

    /// Latency applied to every page request.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    /// Latency applied to requests for one query text.
    pub async fn set_query_delay(&self, query: &str, delay: Duration) {
        self.query_delays
            .write()
            .await
            .insert(fold_text(query.trim()), delay);
    }

    /// Make the by-category route answer with an empty page.
    pub async fn set_by_category_empty(&self, empty: bool) {
        *self.by_category_empty.write().await = empty;
    }

    /// Configure the distinct-categories answer for a flag combination.
    pub async fn set_distinct_categories(
        &self,
        flags: CategoryCountFlags,
        categories: Vec<DistinctCategory>,
    ) {
        self.distinct.write().await.insert(flags, categories);
    }

    /// Get recorded page requests.
    pub async fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.clone()
    }

    /// Number of page requests made.
    pub async fn request_count(&self) -> usize {
        self.requests.read().await.len()
    }

    /// Number of page requests made on one route.
    pub async fn route_count(&self, route: RequestRoute) -> usize {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| r.route == route)
            .count()
    }

    /// Number of distinct-categories requests made.
    pub async fn distinct_calls(&self) -> usize {
        self.distinct_calls.read().await.len()
    }

    async fn serve(&self, route: RequestRoute, query: &ListingQuery) -> Result<ListingPage, CatalogError> {
        self.requests.write().await.push(RecordedRequest {
            route,
            query: query.clone(),
            timestamp: tokio::time::Instant::now(),
        });

        let delay = {
            let base = *self.delay.read().await;
            let extra = match query.text() {
                Some(text) => self.query_delays.read().await.get(&fold_text(text)).copied(),
                None => None,
            };
            extra.or(base)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = self.failures.write().await.pop_front() {
            return Err(error);
        }
        if !query.fields.is_empty() && *self.reject_projection.read().await {
            return Err(CatalogError::ApiError {
                status: 400,
                message: "unknown field in projection".to_string(),
            });
        }
        if route == RequestRoute::ByCategory && *self.by_category_empty.read().await {
            return Ok(ListingPage::new(0, Vec::new()));
        }

        let listings = self.listings.read().await;
        let text = query.text().map(fold_text);
        let matching: Vec<&Listing> = listings
            .iter()
            .filter(|l| query.status.is_none_or(|s| l.status == s))
            .filter(|l| {
                text.as_ref()
                    .is_none_or(|t| fold_text(&l.title).contains(t.as_str()))
            })
            .filter(|l| {
                query.category_ids.is_empty()
                    || l.category_id
                        .as_ref()
                        .is_some_and(|c| query.category_ids.contains(c))
            })
            .collect();

        let items = matching
            .iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .map(|l| (*l).clone())
            .collect();

        Ok(ListingPage::new(matching.len() as u64, items))
    }
}

#[async_trait]
impl CatalogApi for MockCatalogApi {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_listings(&self, query: &ListingQuery) -> Result<ListingPage, CatalogError> {
        self.serve(RequestRoute::Listings, query).await
    }

    async fn fetch_by_category(&self, query: &ListingQuery) -> Result<ListingPage, CatalogError> {
        self.serve(RequestRoute::ByCategory, query).await
    }

    async fn distinct_categories(
        &self,
        flags: &CategoryCountFlags,
    ) -> Result<Vec<DistinctCategory>, CatalogError> {
        self.distinct_calls.write().await.push(*flags);
        Ok(self
            .distinct
            .read()
            .await
            .get(flags)
            .cloned()
            .unwrap_or_default())
    }
}
