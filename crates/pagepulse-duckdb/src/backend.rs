use std::sync::Arc;

use anyhow::Result;
use duckdb::Connection;
use tokio::sync::Mutex;
use tracing::info;

use pagepulse_core::event::VisitorEvent;

use crate::schema::init_sql;

/// A DuckDB backend for the analytics pipeline.
///
/// DuckDB is single-writer: concurrent reads are fine, but concurrent writes
/// cause contention. We wrap the connection in `Arc<Mutex<_>>` so the async
/// runtime serialises access while the struct stays cheap to clone and share
/// across Axum handlers and the fire-and-forget write tasks.
///
/// Memory and thread limits are enforced by [`init_sql`] at open time.
pub struct DuckDbBackend {
    pub(crate) conn: Arc<Mutex<Connection>>,
}

impl DuckDbBackend {
    /// Open (or create) a DuckDB database file at `path`.
    ///
    /// `memory_limit` is a DuckDB size string such as `"1GB"` or `"512MB"`,
    /// read from `Config.duckdb_memory_limit` at the call site. Runs the
    /// schema init SQL so all tables and indexes exist afterwards.
    pub fn open(path: &str, memory_limit: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch(&init_sql(memory_limit))?;
        info!(
            "DuckDB opened at {} with memory_limit={}, threads=2",
            path, memory_limit
        );
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Open an **in-memory** DuckDB database.
    ///
    /// Intended for tests only: data is discarded when the struct is dropped.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&init_sql("1GB"))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Durably append one visitor event.
    ///
    /// The event is written exactly as built by the ingestion endpoint;
    /// nothing here mutates or enriches it. `visitor_id` and
    /// `ip_fingerprint` may be NULL (failed identity resolution), the row
    /// still counts toward visit totals.
    pub async fn insert_event(&self, event: &VisitorEvent) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            r#"INSERT INTO visitor_events (
                id, visitor_id, page_path, referrer, user_agent,
                ip_fingerprint, device_type, browser, os, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)"#,
            duckdb::params![
                event.id,
                event.visitor_id,
                event.page_path,
                event.referrer,
                event.user_agent,
                event.ip_fingerprint,
                event.device_type,
                event.browser,
                event.os,
                event.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Atomically add one to the counter for `page_path` and return the new
    /// value. Creates the row at 1 on first view.
    ///
    /// The upsert-increment is a single statement, never an application-level
    /// read-then-write, so concurrent increments to the same key cannot lose
    /// updates.
    pub async fn increment_page_count(&self, page_path: &str) -> Result<i64> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            r#"INSERT INTO page_view_counters (page_path, count) VALUES (?1, 1)
               ON CONFLICT (page_path) DO UPDATE SET count = count + 1
               RETURNING count"#,
        )?;
        let count: i64 = stmt.query_row(duckdb::params![page_path], |row| row.get(0))?;
        Ok(count)
    }

    /// Current counter value for `page_path`, 0 for paths never viewed.
    pub async fn page_count(&self, page_path: &str) -> Result<i64> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare(
            "SELECT COALESCE((SELECT count FROM page_view_counters WHERE page_path = ?1), 0)",
        )?;
        let count: i64 = stmt.query_row(duckdb::params![page_path], |row| row.get(0))?;
        Ok(count)
    }

    /// Rebuild the counter table from the raw event log.
    ///
    /// The counters are a derived cache of `count(*) group by page_path`;
    /// this restores them after loss or after accepted under-counting from
    /// failed best-effort increments. Runs in one transaction so readers
    /// never observe a partially rebuilt table.
    pub async fn rebuild_page_counters(&self) -> Result<()> {
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction()?;
        tx.execute_batch(
            r#"DELETE FROM page_view_counters;
               INSERT INTO page_view_counters (page_path, count)
               SELECT page_path, COUNT(*) FROM visitor_events GROUP BY page_path;"#,
        )?;
        tx.commit()?;
        tracing::info!("Page-view counters rebuilt from event log");
        Ok(())
    }

    /// Execute `SELECT 1` as a lightweight liveness check.
    ///
    /// Called by the `/health` endpoint. Returns an error if the connection
    /// is unavailable (file locked, disk full, etc.).
    pub async fn ping(&self) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute_batch("SELECT 1")?;
        Ok(())
    }

    /// Acquire the DuckDB connection lock for direct queries.
    ///
    /// Intended for integration tests that need to verify stored data.
    /// Production code should use the typed methods above.
    pub async fn conn_for_test(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}
