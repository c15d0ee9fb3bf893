use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{routes, state::AppState};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// `TraceLayer` gives structured request/response logging via `tracing`.
/// No CORS layer: the tracking script and the dashboard are first-party, and
/// the visitor cookie is `SameSite=Strict` anyway.
pub fn build_app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .route("/track", post(routes::track::track))
        .route("/stats", get(routes::stats::get_stats))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
