//! Storage backend abstraction.

use async_trait::async_trait;

use crate::event::VisitorEvent;
use crate::stats::{StatsSummary, StatsWindow};

/// What the analytics core requires from its datastore: durable event append,
/// an atomic per-key counter increment, and windowed aggregate queries over
/// the event log. The storage engine itself is not specified here.
#[async_trait]
pub trait AnalyticsStore: Send + Sync + 'static {
    /// Durably append one visitor event.
    async fn insert_event(&self, event: &VisitorEvent) -> anyhow::Result<()>;

    /// Atomically add one to the counter for `page_path`, creating it at 1 if
    /// absent, and return the new value. Must be a single storage-layer
    /// primitive: concurrent increments to the same key must never lose
    /// updates.
    async fn increment_page_count(&self, page_path: &str) -> anyhow::Result<i64>;

    /// Current counter value for `page_path`, 0 when the path has never been
    /// viewed. Reflects all increments that completed before this read
    /// started, nothing stronger.
    async fn page_count(&self, page_path: &str) -> anyhow::Result<i64>;

    /// Compute the rollup statistics for `window`. Read-only.
    async fn stats_summary(&self, window: &StatsWindow) -> anyhow::Result<StatsSummary>;

    /// Lightweight liveness check.
    async fn ping(&self) -> anyhow::Result<()>;
}
