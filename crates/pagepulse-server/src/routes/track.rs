use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;

use pagepulse_core::{
    event::{normalize_page_path, TrackPayload, VisitorEvent},
    identity::resolve_visitor,
    ua::classify,
};

use crate::{error::AppError, state::AppState};

/// Name of the client-held identity cookie.
pub const VISITOR_COOKIE: &str = "visitor_id";

/// `POST /track` — record one page view.
///
/// ## Validation
/// `pagePath` missing or empty → 400, nothing is written.
///
/// ## Enrichment
/// - `visitor_id`: reused from the `visitor_id` cookie when it parses as a
///   UUID, freshly minted otherwise.
/// - `ip_fingerprint`: truncated sha256 of the first `X-Forwarded-For` hop.
///   The raw address is never persisted or logged.
/// - `device_type`, `browser`, `os`: heuristic User-Agent classification.
///
/// ## Write path
/// Persistence is dispatched fire-and-forget with a bounded timeout; a
/// storage failure is logged and the response is still a success, so the
/// page render that triggered the event is never coupled to analytics
/// availability.
///
/// ## Response
/// `200 { "success": true }`, re-setting the visitor cookie with its full
/// sliding 90-day lifetime on every request.
#[tracing::instrument(skip(state, headers, payload))]
pub async fn track(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<TrackPayload>,
) -> Result<impl IntoResponse, AppError> {
    let page_path = payload
        .page_path
        .as_deref()
        .and_then(normalize_page_path)
        .ok_or_else(|| AppError::BadRequest("pagePath is required".to_string()))?;

    let client_ip = extract_client_ip(&headers);
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    let existing_token = visitor_token_from_headers(&headers);
    let resolved = resolve_visitor(existing_token.as_deref(), client_ip.as_deref());
    let profile = classify(&user_agent);

    let event = VisitorEvent {
        id: uuid::Uuid::new_v4().to_string(),
        visitor_id: Some(resolved.visitor_id.clone()),
        page_path,
        referrer: payload.referrer.filter(|r| !r.is_empty()),
        user_agent: if user_agent.is_empty() {
            None
        } else {
            Some(user_agent)
        },
        ip_fingerprint: resolved.ip_fingerprint,
        device_type: profile.device_type.as_str().to_string(),
        browser: profile.browser.to_string(),
        os: profile.os.to_string(),
        created_at: Utc::now(),
    };

    state.record_page_view(event);

    let cookie = build_visitor_cookie(
        &resolved.visitor_id,
        state.config.https,
        state.config.visitor_cookie_days,
    );
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "success": true })),
    ))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Extract the real client IP from `X-Forwarded-For` (first entry).
///
/// The server sits behind the content site's reverse proxy, which always
/// sets the header; without it identity resolution proceeds with no
/// fingerprint rather than inventing one.
fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn visitor_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    cookies
        .split(';')
        .find_map(|c| {
            c.trim()
                .strip_prefix(VISITOR_COOKIE)
                .and_then(|rest| rest.strip_prefix('='))
        })
        .map(str::to_string)
}

/// Sliding expiry: the full Max-Age is issued again on every request that
/// presents or receives the token.
fn build_visitor_cookie(visitor_id: &str, https: bool, days: u32) -> String {
    let secure = if https { "; Secure" } else { "" };
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}{}",
        VISITOR_COOKIE,
        visitor_id,
        u64::from(days) * 86_400,
        secure,
    )
}
