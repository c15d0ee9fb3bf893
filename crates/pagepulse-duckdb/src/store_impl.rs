use async_trait::async_trait;

use pagepulse_core::event::VisitorEvent;
use pagepulse_core::stats::{StatsSummary, StatsWindow};
use pagepulse_core::store::AnalyticsStore;

use crate::DuckDbBackend;

#[async_trait]
impl AnalyticsStore for DuckDbBackend {
    async fn insert_event(&self, event: &VisitorEvent) -> anyhow::Result<()> {
        DuckDbBackend::insert_event(self, event).await
    }

    async fn increment_page_count(&self, page_path: &str) -> anyhow::Result<i64> {
        DuckDbBackend::increment_page_count(self, page_path).await
    }

    async fn page_count(&self, page_path: &str) -> anyhow::Result<i64> {
        DuckDbBackend::page_count(self, page_path).await
    }

    async fn stats_summary(&self, window: &StatsWindow) -> anyhow::Result<StatsSummary> {
        crate::queries::summary::stats_summary_inner(self, window).await
    }

    async fn ping(&self) -> anyhow::Result<()> {
        DuckDbBackend::ping(self).await
    }
}
