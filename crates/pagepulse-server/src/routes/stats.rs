use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use pagepulse_core::stats::{StatsSummary, StatsWindow};
use pagepulse_core::store::AnalyticsStore;

use crate::{error::AppError, state::AppState};

#[derive(Debug, Deserialize)]
pub struct StatsParams {
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
struct StatsEnvelope {
    #[serde(flatten)]
    summary: StatsSummary,
    period: u32,
}

/// `GET /stats?days=N` — rollup statistics for the dashboard.
///
/// `days` defaults to the configured window (30) and is clamped to 1..=365.
/// Results are a point-in-time snapshot computed concurrently with
/// ingestion; a datastore failure surfaces as a 500 the dashboard treats as
/// transient.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Query(params): Query<StatsParams>,
) -> Result<impl IntoResponse, AppError> {
    let days = params
        .days
        .unwrap_or(state.config.default_stats_days)
        .clamp(1, 365);

    let window = StatsWindow::last_days(days);
    let summary = state
        .store
        .stats_summary(&window)
        .await
        .map_err(AppError::Internal)?;

    Ok(Json(json!({
        "stats": StatsEnvelope { summary, period: days }
    })))
}
