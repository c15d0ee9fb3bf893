/// DuckDB initialization SQL.
///
/// Executed once at database open time via `Connection::execute_batch`.
/// All statements use `IF NOT EXISTS` so they are safe to re-run on every
/// startup (idempotent).
///
/// `memory_limit` is passed at runtime from `Config.duckdb_memory_limit`
/// (env `PAGEPULSE_DUCKDB_MEMORY`, default `"1GB"`). Always set an explicit
/// limit: the DuckDB default of 80% of system RAM is not acceptable for a
/// process embedded next to the content site. `SET threads = 2` bounds the
/// background thread pool, which is plenty for single-writer embedded use.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

-- ===========================================
-- VISITOR EVENTS (raw page-view log, append-only)
-- ===========================================
CREATE TABLE IF NOT EXISTS visitor_events (
    id              VARCHAR NOT NULL,              -- UUID v4
    visitor_id      VARCHAR,                       -- NULL only when identity resolution failed
    page_path       VARCHAR NOT NULL,              -- normalized, non-empty
    referrer        VARCHAR,
    user_agent      VARCHAR,
    ip_fingerprint  VARCHAR(16),                   -- sha256(addr)[0:16]; raw address never stored
    device_type     VARCHAR NOT NULL,              -- 'desktop' | 'mobile' | 'tablet'
    browser         VARCHAR NOT NULL,              -- lowercase family or 'unknown'
    os              VARCHAR NOT NULL,
    created_at      TIMESTAMP NOT NULL
);

-- Primary query pattern: date-range scans for the aggregation engine
CREATE INDEX IF NOT EXISTS idx_events_time
    ON visitor_events(created_at DESC);

-- Accelerates per-page breakdowns within a date range
CREATE INDEX IF NOT EXISTS idx_events_path_time
    ON visitor_events(page_path, created_at);

-- ===========================================
-- PAGE VIEW COUNTERS (derived, eventually-consistent cache)
-- ===========================================
-- Exact per-page totals, maintained by a single upsert-increment per view.
-- Rebuildable from visitor_events if lost (see rebuild_page_counters).
CREATE TABLE IF NOT EXISTS page_view_counters (
    page_path       VARCHAR PRIMARY KEY,
    count           BIGINT NOT NULL DEFAULT 0
);
"#
    )
}
