use std::sync::Arc;

use tokio_util::task::TaskTracker;
use tracing::{error, warn};

use pagepulse_core::{config::Config, event::VisitorEvent, store::AnalyticsStore};

/// Shared application state injected into every Axum handler via
/// [`axum::extract::State`].
///
/// There is no other shared mutable state between requests; everything the
/// handlers coordinate on lives behind the store.
pub struct AppState {
    /// The analytics datastore. Trait object so the HTTP layer stays
    /// storage-agnostic; the binary wires in the DuckDB backend.
    pub store: Arc<dyn AnalyticsStore>,

    /// Parsed configuration, loaded once at startup from environment variables.
    pub config: Arc<Config>,

    /// Tracks the detached analytics write tasks so shutdown (and tests) can
    /// wait for them with a bound instead of dropping them mid-write.
    writes: TaskTracker,
}

impl AppState {
    pub fn new<S: AnalyticsStore>(store: S, config: Config) -> Self {
        Self {
            store: Arc::new(store),
            config: Arc::new(config),
            writes: TaskTracker::new(),
        }
    }

    /// Dispatch the persistence of one page view and return immediately.
    ///
    /// The page that triggered the event must never wait on, or fail because
    /// of, analytics recording: the write runs on a detached task under a
    /// bounded time budget, and every failure mode is logged rather than
    /// surfaced. A write that exceeds the budget is abandoned, not retried.
    ///
    /// The counter increment is best-effort and independent: if the event
    /// insert lands but the increment does not, the event log stays durable
    /// and the counter under-counts until rebuilt.
    pub fn record_page_view(&self, event: VisitorEvent) {
        let store = Arc::clone(&self.store);
        let budget = self.config.write_timeout();
        let page_path = event.page_path.clone();

        self.writes.spawn(async move {
            match tokio::time::timeout(budget, store.insert_event(&event)).await {
                Err(_) => {
                    warn!(page_path = %page_path, budget_ms = budget.as_millis() as u64,
                        "event insert timed out, event dropped");
                    return;
                }
                Ok(Err(e)) => {
                    error!(page_path = %page_path, error = %e, "event insert failed, event dropped");
                    return;
                }
                Ok(Ok(())) => {}
            }

            match tokio::time::timeout(budget, store.increment_page_count(&page_path)).await {
                Err(_) => warn!(page_path = %page_path, "counter increment timed out"),
                Ok(Err(e)) => warn!(page_path = %page_path, error = %e,
                    "counter increment failed, page total will under-count until rebuilt"),
                Ok(Ok(_)) => {}
            }
        });
    }

    /// Wait for all in-flight analytics writes to settle.
    ///
    /// Used by graceful shutdown (with an outer timeout) and by integration
    /// tests that assert on persisted state after a tracked request.
    pub async fn wait_for_writes(&self) {
        self.writes.close();
        self.writes.wait().await;
        self.writes.reopen();
    }
}
