//! Local mode: initial window plus background streaming into the store.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::{LoaderShared, TaskHandle};
use crate::catalog::{ListingQuery, RequestRoute};
use crate::loader::ListingStore;
use crate::metrics;

impl LoaderShared {
    fn local_query(&self, offset: u32, limit: u32) -> ListingQuery {
        ListingQuery {
            status: Some(self.config.status),
            fields: self.config.fields.clone(),
            ..ListingQuery::page(limit, offset)
        }
    }

    /// Make sure the initial window is in the store.
    ///
    /// Returns whether background streaming still has work to do.
    pub(super) async fn prepare_local(self: &Arc<Self>) -> bool {
        let loaded = self.state.read().await.initial_loaded;
        if !loaded && !self.load_initial().await {
            return false;
        }
        !self.state.read().await.store.is_exhausted()
    }

    /// Fetch the first `initial_batch_size` listings into a fresh store.
    ///
    /// On failure the current store is kept and the error recorded.
    pub(super) async fn load_initial(&self) -> bool {
        self.state.write().await.initial_loading = true;

        let limit = self.config.initial_batch_size;
        let result = self
            .fetch_page(RequestRoute::Listings, self.local_query(0, limit))
            .await;

        let mut state = self.state.write().await;
        state.initial_loading = false;
        match result {
            Ok(entry) => {
                let mut store = ListingStore::new();
                store.merge_batch(0, limit, entry.received, entry.items.clone());
                info!(
                    received = entry.items.len(),
                    stored = store.len(),
                    total = entry.total,
                    "Initial window loaded"
                );
                state.store = store;
                state.initial_loaded = true;
                state.error = None;
                true
            }
            Err(e) => {
                warn!(error = %e, "Initial window failed");
                state.error = Some(format!("Could not load the catalog: {}", e));
                false
            }
        }
    }

    /// Start streaming unless a live stream already exists.
    pub(super) async fn spawn_background(self: &Arc<Self>) {
        let mut tasks = self.tasks.lock().await;
        if tasks.background.as_ref().is_some_and(TaskHandle::is_running) {
            return;
        }
        if let Some(previous) = tasks.background.take() {
            previous.cancel();
        }

        let token = self.shutdown.child_token();
        let handle = tokio::spawn(Arc::clone(self).stream_batches(token.clone()));
        tasks.background = Some(TaskHandle { token, handle });
    }

    pub(super) async fn cancel_background(&self) {
        let tasks = self.tasks.lock().await;
        if let Some(background) = &tasks.background {
            background.cancel();
        }
    }

    /// Fetch batches at increasing offsets until the catalog is exhausted.
    ///
    /// Batches are merged strictly in order. The token is checked before
    /// every request and again under the state lock before every merge.
    async fn stream_batches(self: Arc<Self>, token: CancellationToken) {
        let batch_size = self.config.batch_size;

        loop {
            if token.is_cancelled() {
                debug!("Background loading cancelled");
                return;
            }

            let offset = {
                let state = self.state.read().await;
                if state.store.is_exhausted() {
                    return;
                }
                state.store.next_offset()
            };

            let result = self
                .fetch_page(RequestRoute::Listings, self.local_query(offset, batch_size))
                .await;

            {
                let mut state = self.state.write().await;
                if token.is_cancelled() {
                    debug!(offset, "Background loading cancelled before merge");
                    return;
                }

                match result {
                    Ok(entry) => {
                        state.error = None;
                        if state
                            .store
                            .merge_batch(offset, batch_size, entry.received, entry.items.clone())
                        {
                            metrics::BACKGROUND_BATCHES.inc();
                            debug!(
                                offset,
                                received = entry.items.len(),
                                stored = state.store.len(),
                                "Merged background batch"
                            );
                        }
                        if state.store.is_exhausted() {
                            info!(stored = state.store.len(), "Catalog fully loaded");
                            return;
                        }
                    }
                    Err(e) => {
                        // resumed from next_offset on the next trigger
                        warn!(offset, error = %e, "Background batch failed");
                        state.error = Some(format!("Could not load more listings: {}", e));
                        return;
                    }
                }
            }

            tokio::task::yield_now().await;
        }
    }
}
