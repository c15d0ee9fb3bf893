use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use pagepulse_core::config::Config;
use pagepulse_core::stats::StatsWindow;
use pagepulse_core::store::AnalyticsStore;
use pagepulse_duckdb::DuckDbBackend;
use pagepulse_server::app::build_app;
use pagepulse_server::state::AppState;

const IPHONE_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_5 like Mac OS X) \
    AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.5 Mobile/15E148 Safari/604.1";

fn config() -> Config {
    Config {
        port: 0,
        data_dir: "/tmp/pagepulse-test".to_string(),
        duckdb_memory_limit: "1GB".to_string(),
        https: false,
        visitor_cookie_days: 90,
        write_timeout_ms: 2000,
        default_stats_days: 30,
    }
}

fn setup() -> (Arc<AppState>, axum::Router) {
    let db = DuckDbBackend::open_in_memory().expect("in-memory DuckDB");
    let state = Arc::new(AppState::new(db, config()));
    let app = build_app(Arc::clone(&state));
    (state, app)
}

async fn json_body(response: axum::http::Response<Body>) -> Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("read body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("parse JSON")
}

async fn track(
    app: &axum::Router,
    body: Value,
    cookie: Option<&str>,
) -> axum::http::Response<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/track")
        .header("content-type", "application/json")
        .header("x-forwarded-for", "203.0.113.5")
        .header("user-agent", IPHONE_UA);
    if let Some(cookie) = cookie {
        builder = builder.header("cookie", cookie);
    }
    let request = builder
        .body(Body::from(body.to_string()))
        .expect("build request");
    app.clone().oneshot(request).await.expect("request")
}

fn set_cookie_header(response: &axum::http::Response<Body>) -> String {
    response
        .headers()
        .get("set-cookie")
        .expect("Set-Cookie header must be present")
        .to_str()
        .expect("valid header")
        .to_string()
}

fn visitor_id_of(set_cookie: &str) -> String {
    set_cookie
        .strip_prefix("visitor_id=")
        .and_then(|rest| rest.split(';').next())
        .expect("cookie value")
        .to_string()
}

#[tokio::test]
async fn missing_page_path_is_rejected_and_nothing_is_written() {
    let (state, app) = setup();

    for body in [json!({}), json!({ "pagePath": "" }), json!({ "pagePath": "   " })] {
        let response = track(&app, body, None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    state.wait_for_writes().await;
    let summary = state
        .store
        .stats_summary(&StatsWindow::last_days(1))
        .await
        .expect("stats");
    assert_eq!(summary.total_visits, 0, "no event row may exist");
    assert_eq!(
        state.store.page_count("/").await.expect("counter"),
        0,
        "no counter increment may occur"
    );
}

#[tokio::test]
async fn new_visitor_receives_a_strict_sliding_cookie() {
    let (_state, app) = setup();

    let response = track(&app, json!({ "pagePath": "/albums" }), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = set_cookie_header(&response);
    assert!(set_cookie.starts_with("visitor_id="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));
    assert!(set_cookie.contains("Path=/"));
    // 90 days, sliding.
    assert!(set_cookie.contains("Max-Age=7776000"));
    assert!(
        !set_cookie.contains("Secure"),
        "no Secure flag when https=false"
    );

    let visitor_id = visitor_id_of(&set_cookie);
    assert!(
        uuid::Uuid::parse_str(&visitor_id).is_ok(),
        "token must be a UUID"
    );

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
}

#[tokio::test]
async fn presented_token_is_reused_and_its_expiry_refreshed() {
    let (_state, app) = setup();

    let first = track(&app, json!({ "pagePath": "/albums" }), None).await;
    let visitor_id = visitor_id_of(&set_cookie_header(&first));

    let cookie = format!("visitor_id={visitor_id}");
    let second = track(&app, json!({ "pagePath": "/news" }), Some(&cookie)).await;
    assert_eq!(second.status(), StatusCode::OK);

    let set_cookie = set_cookie_header(&second);
    assert_eq!(
        visitor_id_of(&set_cookie),
        visitor_id,
        "identity must be stable across requests"
    );
    assert!(
        set_cookie.contains("Max-Age=7776000"),
        "expiry must slide on reuse"
    );
}

#[tokio::test]
async fn malformed_token_is_replaced_with_a_fresh_one() {
    let (_state, app) = setup();

    let response = track(
        &app,
        json!({ "pagePath": "/albums" }),
        Some("visitor_id=not-a-uuid"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let visitor_id = visitor_id_of(&set_cookie_header(&response));
    assert_ne!(visitor_id, "not-a-uuid");
    assert!(uuid::Uuid::parse_str(&visitor_id).is_ok());
}

#[tokio::test]
async fn mobile_safari_view_is_classified_and_counted() {
    let (state, app) = setup();

    let response = track(&app, json!({ "pagePath": "/albums" }), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    state.wait_for_writes().await;

    let summary = state
        .store
        .stats_summary(&StatsWindow::last_days(1))
        .await
        .expect("stats");
    assert_eq!(summary.total_visits, 1);
    assert_eq!(summary.devices.get("mobile"), Some(&1));
    assert_eq!(summary.browsers.get("safari"), Some(&1));
    assert_eq!(
        state.store.page_count("/albums").await.expect("counter"),
        1
    );
}

#[tokio::test]
async fn page_path_is_normalized_before_persistence() {
    let (state, app) = setup();

    let response = track(
        &app,
        json!({ "pagePath": "/albums/?ref=newsletter" }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    state.wait_for_writes().await;

    let summary = state
        .store
        .stats_summary(&StatsWindow::last_days(1))
        .await
        .expect("stats");
    assert_eq!(summary.top_pages.len(), 1);
    assert_eq!(summary.top_pages[0].path, "/albums");
    assert_eq!(
        state.store.page_count("/albums").await.expect("counter"),
        1
    );
}
