//! Windowed rollup queries for the aggregation engine.
//!
//! All queries are read-only and run against a point-in-time snapshot of the
//! event log; they never touch the counter table. Timestamps are stored and
//! bucketed in UTC, the fixed reporting timezone.

use std::collections::BTreeMap;

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use duckdb::Connection;

use pagepulse_core::stats::{
    PageCount, StatsSummary, StatsWindow, TrendPoint, TOP_PAGES_LIMIT, TREND_DAYS,
};

use crate::DuckDbBackend;

pub async fn stats_summary_inner(db: &DuckDbBackend, window: &StatsWindow) -> Result<StatsSummary> {
    let conn = db.conn.lock().await;

    let start = fmt_ts(window.start);
    let end = fmt_ts(window.end);

    let (total_visits, unique_visitors) = visit_counts(&conn, &start, &end)?;
    let top_pages = top_pages(&conn, &start, &end)?;
    let devices = categorical_counts(&conn, "device_type", &start, &end)?;
    let browsers = categorical_counts(&conn, "browser", &start, &end)?;
    let daily_trend = daily_trend(&conn, window.end)?;

    Ok(StatsSummary {
        total_visits,
        unique_visitors,
        top_pages,
        devices,
        browsers,
        daily_trend,
    })
}

impl DuckDbBackend {
    pub async fn stats_summary(&self, window: &StatsWindow) -> Result<StatsSummary> {
        stats_summary_inner(self, window).await
    }
}

/// Total visits and exact distinct-visitor count for the window.
///
/// `COUNT(DISTINCT visitor_id)` ignores NULLs, which is exactly the contract:
/// events whose identity resolution failed count toward volume but not toward
/// unique visitors. Exact counting is fine at this traffic scale; a bounded
/// sketch could replace it behind the same shape if volume ever outgrows it.
fn visit_counts(conn: &Connection, start: &str, end: &str) -> Result<(i64, i64)> {
    let mut stmt = conn.prepare(
        r#"SELECT COUNT(*), COUNT(DISTINCT visitor_id)
           FROM visitor_events
           WHERE created_at >= ?1 AND created_at < ?2"#,
    )?;
    let counts = stmt.query_row(duckdb::params![start, end], |row| {
        Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
    })?;
    Ok(counts)
}

/// Highest-viewed pages in the window, descending by count, ties broken by
/// lexicographic path order. The LIMIT pushes the top-N selection down into
/// the storage engine instead of sorting every distinct page in Rust.
fn top_pages(conn: &Connection, start: &str, end: &str) -> Result<Vec<PageCount>> {
    let sql = format!(
        r#"SELECT page_path, COUNT(*) AS views
           FROM visitor_events
           WHERE created_at >= ?1 AND created_at < ?2
           GROUP BY page_path
           ORDER BY views DESC, page_path ASC
           LIMIT {TOP_PAGES_LIMIT}"#
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(duckdb::params![start, end], |row| {
        Ok(PageCount {
            path: row.get(0)?,
            views: row.get(1)?,
        })
    })?;
    rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
}

/// Event counts grouped by one categorical column. Categories with zero
/// events in the window simply do not appear.
///
/// `column` comes from a fixed internal list, never from user input.
fn categorical_counts(
    conn: &Connection,
    column: &str,
    start: &str,
    end: &str,
) -> Result<BTreeMap<String, i64>> {
    let sql = format!(
        r#"SELECT {column}, COUNT(*)
           FROM visitor_events
           WHERE created_at >= ?1 AND created_at < ?2
           GROUP BY {column}"#
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(duckdb::params![start, end], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut counts = BTreeMap::new();
    for row in rows {
        let (category, count) = row?;
        counts.insert(category, count);
    }
    Ok(counts)
}

/// Events per calendar day over the [`TREND_DAYS`] most recent days ending at
/// `end`, chronological. Zero-filled: every day appears, absent days as 0.
fn daily_trend(conn: &Connection, end: DateTime<Utc>) -> Result<Vec<TrendPoint>> {
    let last_day = end.date_naive();
    let first_day = last_day - Duration::days(TREND_DAYS - 1);

    let mut stmt = conn.prepare(
        r#"SELECT strftime(created_at, '%Y-%m-%d') AS day, COUNT(*)
           FROM visitor_events
           WHERE created_at >= ?1 AND created_at < ?2
           GROUP BY day
           ORDER BY day"#,
    )?;
    let rows = stmt.query_map(
        duckdb::params![fmt_date(first_day), fmt_ts(end)],
        |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
    )?;

    let mut by_day: BTreeMap<String, i64> = BTreeMap::new();
    for row in rows {
        let (day, visits) = row?;
        by_day.insert(day, visits);
    }

    let mut series = Vec::with_capacity(TREND_DAYS as usize);
    let mut day = first_day;
    while day <= last_day {
        let key = day.format("%Y-%m-%d").to_string();
        let visits = by_day.get(&key).copied().unwrap_or(0);
        series.push(TrendPoint { date: key, visits });
        day += Duration::days(1);
    }
    Ok(series)
}

/// Format a UTC instant the way DuckDB compares TIMESTAMP columns.
fn fmt_ts(ts: DateTime<Utc>) -> String {
    ts.naive_utc().format("%Y-%m-%d %H:%M:%S%.6f").to_string()
}

fn fmt_date(date: NaiveDate) -> String {
    format!("{} 00:00:00", date.format("%Y-%m-%d"))
}
