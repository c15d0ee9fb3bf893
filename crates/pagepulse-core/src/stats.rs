//! Aggregation window and result types.

use std::collections::BTreeMap;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Maximum number of entries returned in the top-pages ranking.
pub const TOP_PAGES_LIMIT: usize = 10;

/// The daily trend always covers this many most-recent calendar days,
/// independent of the main window parameter.
pub const TREND_DAYS: i64 = 7;

/// A half-open time window `[start, end)` over the event log.
#[derive(Debug, Clone, Copy)]
pub struct StatsWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl StatsWindow {
    /// The window covering the last `days` days, ending now.
    pub fn last_days(days: u32) -> Self {
        let end = Utc::now();
        Self {
            start: end - Duration::days(i64::from(days)),
            end,
        }
    }

    /// An explicit range. `end` must not precede `start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self> {
        if end < start {
            return Err(anyhow!("window end must be on or after window start"));
        }
        Ok(Self { start, end })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageCount {
    pub path: String,
    pub views: i64,
}

/// One calendar day (UTC) of the trend series, date formatted `YYYY-MM-DD`.
#[derive(Debug, Clone, Serialize)]
pub struct TrendPoint {
    pub date: String,
    pub visits: i64,
}

/// Rollup statistics for one window, as served to the dashboard.
///
/// `devices` and `browsers` omit categories with zero events. `daily_trend`
/// is zero-filled: all [`TREND_DAYS`] days appear, chronologically, absent
/// days with `visits = 0`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_visits: i64,
    pub unique_visitors: i64,
    pub top_pages: Vec<PageCount>,
    pub devices: BTreeMap<String, i64>,
    pub browsers: BTreeMap<String, i64>,
    pub daily_trend: Vec<TrendPoint>,
}
