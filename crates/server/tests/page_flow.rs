use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::posts::PostSource;
use common::types::Post;
use common::CoreError;
use configs::AppConfig;
use tower::ServiceExt;
use wiremock::matchers::{header as header_eq, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use server::observability::PAGE_RENDER_FAILURES_TOTAL;
use server::routes;
use server::startup::build_app;
use server::state::AppState;

fn cors() -> tower_http::cors::CorsLayer { tower_http::cors::CorsLayer::very_permissive() }

fn app_for(upstream: &MockServer) -> anyhow::Result<Router> {
    let mut cfg = AppConfig::default();
    cfg.upstream.url = format!("{}/posts/1", upstream.uri());
    build_app(&cfg)
}

async fn get(app: Router, uri: &str) -> anyhow::Result<(StatusCode, axum::http::HeaderMap, String)> {
    let req = Request::builder().method("GET").uri(uri).body(Body::empty())?;
    let res = app.oneshot(req).await?;
    let status = res.status();
    let headers = res.headers().clone();
    let bytes = to_bytes(res.into_body(), usize::MAX).await?;
    Ok((status, headers, String::from_utf8(bytes.to_vec())?))
}

#[tokio::test]
async fn renders_post_from_upstream() -> anyhow::Result<()> {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "userId": 1, "id": 1, "title": "T", "body": "B"
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let (status, headers, body) = get(app_for(&upstream)?, "/ssr").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(headers[header::CONTENT_TYPE].to_str()?.starts_with("text/html"));
    assert_eq!(headers[header::CACHE_CONTROL], "no-store");
    assert!(body.contains("<h1>Server-Side Rendering in Rust</h1>"));
    assert!(body.contains("<h2>T</h2>"));
    assert!(body.contains("<p>B</p>"));
    Ok(())
}

#[tokio::test]
async fn every_render_bypasses_cache_and_fetches_once() -> anyhow::Result<()> {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts/1"))
        .and(header_eq("cache-control", "no-store"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "title": "T", "body": "B"
        })))
        .expect(3)
        .mount(&upstream)
        .await;

    let app = app_for(&upstream)?;
    for _ in 0..3 {
        let (status, _, _) = get(app.clone(), "/ssr").await?;
        assert_eq!(status, StatusCode::OK);
    }
    Ok(())
}

#[tokio::test]
async fn upstream_error_status_fails_render() -> anyhow::Result<()> {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
            "title": "stale", "body": "stale"
        })))
        .expect(1)
        .mount(&upstream)
        .await;

    let failures_before = PAGE_RENDER_FAILURES_TOTAL.get();
    let (status, _, body) = get(app_for(&upstream)?, "/ssr").await?;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(PAGE_RENDER_FAILURES_TOTAL.get() > failures_before);
    assert!(!body.contains("<h2>"));
    let json: serde_json::Value = serde_json::from_str(&body)?;
    assert!(json["error"].as_str().unwrap_or_default().contains("500"));
    Ok(())
}

#[tokio::test]
async fn malformed_json_fails_render() -> anyhow::Result<()> {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{\"title\": \"T\""))
        .expect(1)
        .mount(&upstream)
        .await;

    let (status, _, body) = get(app_for(&upstream)?, "/ssr").await?;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("parse error"));
    Ok(())
}

#[tokio::test]
async fn missing_fields_fail_render() -> anyhow::Result<()> {
    let upstream = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": 1})))
        .mount(&upstream)
        .await;

    let (status, _, _) = get(app_for(&upstream)?, "/ssr").await?;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    Ok(())
}

struct CountingSource {
    calls: AtomicUsize,
}

#[async_trait]
impl PostSource for CountingSource {
    async fn fetch_post(&self) -> Result<Post, CoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(Post { user_id: None, id: None, title: "Custom".into(), body: "Text".into() })
    }
}

#[tokio::test]
async fn heading_comes_from_state() -> anyhow::Result<()> {
    let source = Arc::new(CountingSource { calls: AtomicUsize::new(0) });
    let state = AppState::new(source.clone(), "My Page");
    let app = routes::build_router(state, cors());

    let (status, _, body) = get(app, "/ssr").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("<h1>My Page</h1>"));
    assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn health_and_metrics_do_not_touch_upstream() -> anyhow::Result<()> {
    let source = Arc::new(CountingSource { calls: AtomicUsize::new(0) });
    let app = routes::build_router(AppState::new(source.clone(), "h"), cors());

    let (status, _, body) = get(app.clone(), "/health").await?;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body)?;
    assert_eq!(json["status"], "ok");

    let (status, _, body) = get(app, "/metrics").await?;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ssr_page_renders_total"));
    assert!(body.contains("ssr_upstream_fetches_total"));

    assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    Ok(())
}
