//! Server mode: debounced, sequenced page requests.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use super::{BrowseCriteria, LoaderMode, LoaderShared, ServerPage, TaskHandle};
use crate::catalog::{ListingQuery, RequestRoute};
use crate::dedup::deduplicate;
use crate::metrics;
use crate::taxonomy;

impl LoaderShared {
    /// Route and query for the current criteria.
    ///
    /// Text searches use the generic route. A category alone uses the
    /// by-category route with the slug's provider ids; a slug without ids
    /// (the fallback bucket) goes to the generic route and is narrowed
    /// client-side.
    pub(super) fn server_request(&self, criteria: &BrowseCriteria) -> (RequestRoute, ListingQuery) {
        let text = criteria.text();
        let category_ids: Vec<String> = criteria
            .category_slug()
            .map(|slug| {
                taxonomy::category_ids_for(slug)
                    .into_iter()
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let route = if text.is_none() && !category_ids.is_empty() {
            RequestRoute::ByCategory
        } else {
            RequestRoute::Listings
        };

        let query = ListingQuery {
            limit: criteria.page_size,
            offset: criteria.offset(),
            status: Some(self.config.status),
            query: text.map(String::from),
            category_ids,
            fields: self.config.fields.clone(),
        };

        (route, query)
    }

    /// Replace any pending request with a new one after `delay`.
    ///
    /// The sequence number is taken here, when the input arrives, so a
    /// response to an older input is discarded even while the newer one is
    /// still debouncing. Superseding cancels only the wait; a request
    /// already on the wire completes and is dropped by that number.
    pub(super) async fn schedule_server(self: &Arc<Self>, delay: Option<Duration>) {
        let seq = {
            let mut state = self.state.write().await;
            state.server_loading = true;
            self.sequence.fetch_add(1, Ordering::SeqCst) + 1
        };

        let mut tasks = self.tasks.lock().await;
        if let Some(previous) = tasks.server.take() {
            previous.cancel();
        }

        let token = self.shutdown.child_token();
        let task_token = token.clone();
        let shared = Arc::clone(self);
        let handle = tokio::spawn(async move {
            if let Some(delay) = delay {
                tokio::select! {
                    _ = task_token.cancelled() => {
                        debug!("Pending search superseded");
                        return;
                    }
                    _ = tokio::time::sleep(delay) => {}
                }
            } else if task_token.is_cancelled() {
                return;
            }
            shared.run_server_fetch(seq).await;
        });

        tasks.server = Some(TaskHandle { token, handle });
    }

    /// Forget pending and in-flight Server-mode work.
    pub(super) async fn leave_server(&self) {
        {
            let tasks = self.tasks.lock().await;
            if let Some(server) = &tasks.server {
                server.cancel();
            }
        }
        self.sequence.fetch_add(1, Ordering::SeqCst);

        let mut state = self.state.write().await;
        state.server_page = None;
        state.server_loading = false;
    }

    async fn run_server_fetch(self: Arc<Self>, seq: u64) {
        let criteria = self.state.read().await.criteria.clone();
        if self.sequence.load(Ordering::SeqCst) != seq
            || LoaderMode::for_criteria(&criteria) != LoaderMode::Server
        {
            return;
        }

        let (route, query) = self.server_request(&criteria);
        debug!(seq, ?route, offset = query.offset, "Issuing server request");

        let mut result = self.fetch_page(route, query.clone()).await;
        if route == RequestRoute::ByCategory && matches!(&result, Ok(entry) if entry.items.is_empty())
        {
            info!(
                categories = ?query.category_ids,
                "Category route returned nothing, retrying generic route"
            );
            metrics::FALLBACKS.with_label_values(&["empty_category"]).inc();
            result = self.fetch_page(RequestRoute::Listings, query).await;
        }

        let mut state = self.state.write().await;
        if self.sequence.load(Ordering::SeqCst) != seq || self.shutdown.is_cancelled() {
            metrics::STALE_RESPONSES_DISCARDED.inc();
            debug!(seq, "Discarding superseded server response");
            return;
        }

        state.server_loading = false;
        match result {
            Ok(entry) => {
                let items = deduplicate(entry.items.clone());
                debug!(
                    seq,
                    received = entry.items.len(),
                    kept = items.len(),
                    total = entry.total,
                    "Server page applied"
                );
                state.server_page = Some(ServerPage {
                    items,
                    total: entry.total,
                    page: criteria.page,
                });
                state.error = None;
            }
            Err(e) => {
                warn!(seq, error = %e, "Server request failed");
                state.error = Some(format!("Results are unavailable right now: {}", e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::cache::RequestCache;
    use crate::catalog::RequestRoute;
    use crate::config::LoaderConfig;
    use crate::listing::{Listing, ListingStatus};
    use crate::loader::{LoaderMode, PageLoader};
    use crate::testing::{fixtures, MockCatalogApi};
    use std::sync::Arc;
    use std::time::Duration;

    fn config() -> LoaderConfig {
        LoaderConfig {
            page_size: 10,
            debounce_ms: 200,
            ..Default::default()
        }
    }

    fn categorized(id: &str, category: &str) -> Listing {
        let mut listing = fixtures::listing(id, 50.0);
        listing.category_id = Some(category.to_string());
        listing
    }

    #[tokio::test(start_paused = true)]
    async fn test_category_uses_by_category_route() {
        let api = Arc::new(MockCatalogApi::with_listings(vec![
            categorized("a", "MLA1430"),
            categorized("b", "MLA1574"),
        ]));
        let loader = PageLoader::new(api.clone(), RequestCache::default(), config());

        loader.set_category(Some("ropa".to_string())).await;
        loader.wait_idle().await;

        let requests = api.recorded_requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].route, RequestRoute::ByCategory);
        assert!(requests[0].query.category_ids.contains(&"MLA1430".to_string()));

        let view = loader.view().await;
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].listing_id, "a");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_category_falls_back_once() {
        let api = Arc::new(MockCatalogApi::with_listings(vec![
            categorized("a", "MLA1430"),
            categorized("b", "MLA1574"),
        ]));
        api.set_by_category_empty(true).await;
        let loader = PageLoader::new(api.clone(), RequestCache::default(), config());

        loader.set_category(Some("ropa".to_string())).await;
        loader.wait_idle().await;

        let routes: Vec<RequestRoute> = api
            .recorded_requests()
            .await
            .into_iter()
            .map(|r| r.route)
            .collect();
        assert_eq!(routes, vec![RequestRoute::ByCategory, RequestRoute::Listings]);

        // the generic route still honours the category ids
        let view = loader.view().await;
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].listing_id, "a");
    }

    #[tokio::test(start_paused = true)]
    async fn test_fallback_slug_uses_generic_route() {
        let api = Arc::new(MockCatalogApi::with_listings(vec![
            categorized("a", "MLA1430"),
            categorized("b", "MLA999999"),
        ]));
        let loader = PageLoader::new(api.clone(), RequestCache::default(), config());

        loader.set_category(Some("otros".to_string())).await;
        loader.wait_idle().await;

        let requests = api.recorded_requests().await;
        assert_eq!(requests[0].route, RequestRoute::Listings);
        assert!(requests[0].query.category_ids.is_empty());

        let view = loader.view().await;
        let ids: Vec<&str> = view.items.iter().map(|l| l.listing_id.as_str()).collect();
        assert_eq!(ids, vec!["b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_response_discarded() {
        let mut first = fixtures::listing("mate-1", 10.0);
        first.title = "Mate imperial".to_string();
        let mut second = fixtures::listing("bombilla-1", 20.0);
        second.title = "Bombilla de alpaca".to_string();
        let api = Arc::new(MockCatalogApi::with_listings(vec![first, second]));
        api.set_query_delay("mate", Duration::from_millis(2_000)).await;

        let loader = PageLoader::new(api.clone(), RequestCache::default(), config());

        // request A is issued and still on the wire when B is typed
        loader.set_query("mate").await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        loader.set_query("bombilla").await;
        loader.wait_idle().await;
        // let A finish
        tokio::time::sleep(Duration::from_millis(3_000)).await;

        let view = loader.view().await;
        assert_eq!(view.mode, LoaderMode::Server);
        let ids: Vec<&str> = view.items.iter().map(|l| l.listing_id.as_str()).collect();
        assert_eq!(ids, vec!["bombilla-1"]);
        assert_eq!(api.recorded_requests().await.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_leaving_server_mode_discards_in_flight() {
        let api = Arc::new(MockCatalogApi::with_listings(fixtures::catalog(5)));
        api.set_delay(Duration::from_millis(1_000)).await;
        let loader = PageLoader::new(api.clone(), RequestCache::default(), config());
        loader.start().await;
        loader.wait_idle().await;

        loader.set_query("listing").await;
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(loader.set_query("").await, LoaderMode::Local);
        tokio::time::sleep(Duration::from_millis(2_000)).await;

        let view = loader.view().await;
        assert_eq!(view.mode, LoaderMode::Local);
        assert_eq!(view.loaded_count, 5);
        assert!(!view.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn test_server_page_is_deduplicated() {
        let api = Arc::new(MockCatalogApi::with_listings(vec![
            fixtures::grouped_listing("x1", "G", ListingStatus::Active, 1, 0.5, 10.0),
            fixtures::grouped_listing("x2", "G", ListingStatus::Active, 8, 0.5, 10.0),
        ]));
        let loader = PageLoader::new(api, RequestCache::default(), config());

        loader.set_query("listing").await;
        loader.wait_idle().await;

        let view = loader.view().await;
        assert_eq!(view.items.len(), 1);
        assert_eq!(view.items[0].listing_id, "x2");
        // total is the server's count, not the deduplicated length
        assert_eq!(view.total, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_older_response_does_not_end_newer_debounce() {
        let mut first = fixtures::listing("mate-1", 10.0);
        first.title = "Mate imperial".to_string();
        let mut second = fixtures::listing("bombilla-1", 20.0);
        second.title = "Bombilla de alpaca".to_string();
        let api = Arc::new(MockCatalogApi::with_listings(vec![first, second]));
        api.set_query_delay("mate", Duration::from_millis(400)).await;

        let loader = PageLoader::new(api.clone(), RequestCache::default(), config());

        // A goes out at 200ms and answers at 600ms, inside B's debounce
        loader.set_query("mate").await;
        tokio::time::sleep(Duration::from_millis(500)).await;
        loader.set_query("bombilla").await;
        tokio::time::sleep(Duration::from_millis(150)).await;

        let pending = loader.view().await;
        assert!(pending.loading);
        assert!(pending.items.iter().all(|l| l.listing_id != "mate-1"));

        loader.wait_idle().await;
        let view = loader.view().await;
        assert!(!view.loading);
        let ids: Vec<&str> = view.items.iter().map(|l| l.listing_id.as_str()).collect();
        assert_eq!(ids, vec!["bombilla-1"]);
    }
}
