// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! HTTP strategies against a local axum server

use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use url_markdown::fetch::{
    FetchError, FetchStrategy, HttpStrategy, RaceCoordinator, ResultCache, RetryPolicy,
    ScrapeError, StaticUserAgent, StealthHttpStrategy,
};

const PAGE: &str = "<html><head><title>Hello Page</title></head><body><p>Hi</p></body></html>";

const PNG: &[u8] = &[
    0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0x00, 0x00, 0x0d, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1f,
];

#[derive(Clone, Default)]
struct Counters {
    flaky: Arc<AtomicUsize>,
    missing: Arc<AtomicUsize>,
    down: Arc<AtomicUsize>,
}

async fn page() -> Html<&'static str> {
    Html(PAGE)
}

async fn flaky(State(counters): State<Counters>) -> Response {
    // 503 twice, then the page
    if counters.flaky.fetch_add(1, Ordering::SeqCst) < 2 {
        StatusCode::SERVICE_UNAVAILABLE.into_response()
    } else {
        Html(PAGE).into_response()
    }
}

async fn missing(State(counters): State<Counters>) -> StatusCode {
    counters.missing.fetch_add(1, Ordering::SeqCst);
    StatusCode::NOT_FOUND
}

async fn down(State(counters): State<Counters>) -> StatusCode {
    counters.down.fetch_add(1, Ordering::SeqCst);
    StatusCode::BAD_GATEWAY
}

async fn challenge() -> Html<&'static str> {
    Html(
        r#"<html><head><title>Just a moment...</title></head>
        <body><div id="cf-browser-verification">Checking your browser before accessing</div></body></html>"#,
    )
}

async fn blank() -> Html<&'static str> {
    Html("   \n  ")
}

async fn untitled() -> Html<&'static str> {
    Html("<html><body><p>No title</p></body></html>")
}

async fn image() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "image/png")], PNG)
}

async fn undeclared_binary() -> impl IntoResponse {
    // No Content-Type header at all
    let mut response = PNG.into_response();
    response.headers_mut().remove(header::CONTENT_TYPE);
    response
}

async fn echo_headers(headers: HeaderMap) -> Html<String> {
    let get = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("-")
            .to_string()
    };
    Html(format!(
        "<html><head><title>{}</title></head><body><p>{}</p></body></html>",
        get("user-agent"),
        get("sec-fetch-mode")
    ))
}

async fn serve() -> (SocketAddr, Counters) {
    let counters = Counters::default();
    let app = Router::new()
        .route("/page", get(page))
        .route("/flaky", get(flaky))
        .route("/missing", get(missing))
        .route("/down", get(down))
        .route("/challenge", get(challenge))
        .route("/blank", get(blank))
        .route("/untitled", get(untitled))
        .route("/image", get(image))
        .route("/undeclared", get(undeclared_binary))
        .route("/headers", get(echo_headers))
        .with_state(counters.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, counters)
}

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        initial_delay_ms: 10,
        max_delay_ms: 40,
        ..RetryPolicy::default()
    }
}

fn ua(value: &str) -> Arc<StaticUserAgent> {
    Arc::new(StaticUserAgent(value.to_string()))
}

#[tokio::test]
async fn test_http_fetches_page_and_title() {
    let (addr, _) = serve().await;
    let strategy = HttpStrategy::new(fast_retry(), ua("TestBot/1.0")).unwrap();

    let result = strategy.fetch(&format!("http://{}/page", addr)).await.unwrap();
    assert_eq!(result.title, "Hello Page");
    assert!(result.content.contains("<p>Hi</p>"));
}

#[tokio::test]
async fn test_http_retries_transient_status() {
    let (addr, counters) = serve().await;
    let strategy = HttpStrategy::new(fast_retry(), ua("TestBot/1.0")).unwrap();

    let result = strategy.fetch(&format!("http://{}/flaky", addr)).await.unwrap();
    assert_eq!(result.title, "Hello Page");
    assert_eq!(counters.flaky.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_http_does_not_retry_not_found() {
    let (addr, counters) = serve().await;
    let strategy = HttpStrategy::new(fast_retry(), ua("TestBot/1.0")).unwrap();

    let err = strategy
        .fetch(&format!("http://{}/missing", addr))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 404, .. }));
    assert_eq!(counters.missing.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_http_gives_up_after_max_attempts() {
    let (addr, counters) = serve().await;
    let strategy = HttpStrategy::new(fast_retry(), ua("TestBot/1.0")).unwrap();

    let err = strategy
        .fetch(&format!("http://{}/down", addr))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 502, .. }));
    assert_eq!(counters.down.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_http_rejects_challenge_page() {
    let (addr, _) = serve().await;
    let strategy = HttpStrategy::new(fast_retry(), ua("TestBot/1.0")).unwrap();

    let err = strategy
        .fetch(&format!("http://{}/challenge", addr))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::ChallengePage { .. }));
}

#[tokio::test]
async fn test_http_rejects_blank_body() {
    let (addr, _) = serve().await;
    let strategy = HttpStrategy::new(fast_retry(), ua("TestBot/1.0")).unwrap();

    let err = strategy
        .fetch(&format!("http://{}/blank", addr))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::EmptyBody { .. }));
}

#[tokio::test]
async fn test_http_rejects_image_response() {
    let (addr, _) = serve().await;
    let strategy = HttpStrategy::new(fast_retry(), ua("TestBot/1.0")).unwrap();

    let err = strategy
        .fetch(&format!("http://{}/image", addr))
        .await
        .unwrap_err();
    match err {
        FetchError::NotHtml { content_type, .. } => assert_eq!(content_type, "image/png"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_http_rejects_binary_without_content_type() {
    let (addr, _) = serve().await;
    let strategy = HttpStrategy::new(fast_retry(), ua("TestBot/1.0")).unwrap();

    let err = strategy
        .fetch(&format!("http://{}/undeclared", addr))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::NotHtml { .. }));
}

#[tokio::test]
async fn test_stealth_rejects_image_response() {
    let (addr, _) = serve().await;
    let strategy = StealthHttpStrategy::new(fast_retry(), ua("Mozilla/5.0 Test")).unwrap();

    let err = strategy
        .fetch(&format!("http://{}/image", addr))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::NotHtml { .. }));
}

#[tokio::test]
async fn test_http_untitled_page_uses_url() {
    let (addr, _) = serve().await;
    let strategy = HttpStrategy::new(fast_retry(), ua("TestBot/1.0")).unwrap();
    let url = format!("http://{}/untitled", addr);

    let result = strategy.fetch(&url).await.unwrap();
    assert_eq!(result.title, url);
}

#[tokio::test]
async fn test_http_sends_supplied_user_agent() {
    let (addr, _) = serve().await;
    let strategy = HttpStrategy::new(fast_retry(), ua("TestBot/1.0")).unwrap();

    let result = strategy
        .fetch(&format!("http://{}/headers", addr))
        .await
        .unwrap();
    assert_eq!(result.title, "TestBot/1.0");
    // No browser fingerprint on the plain strategy
    assert!(result.content.contains("<p>-</p>"));
}

#[tokio::test]
async fn test_stealth_sends_browser_fingerprint() {
    let (addr, _) = serve().await;
    let strategy = StealthHttpStrategy::new(fast_retry(), ua("Mozilla/5.0 Test")).unwrap();

    let result = strategy
        .fetch(&format!("http://{}/headers", addr))
        .await
        .unwrap();
    assert_eq!(result.title, "Mozilla/5.0 Test");
    assert!(result.content.contains("<p>navigate</p>"));
}

#[tokio::test]
async fn test_stealth_rejects_challenge_page() {
    let (addr, _) = serve().await;
    let strategy = StealthHttpStrategy::new(fast_retry(), ua("Mozilla/5.0 Test")).unwrap();

    let err = strategy
        .fetch(&format!("http://{}/challenge", addr))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::ChallengePage { .. }));
}

#[tokio::test]
async fn test_chain_falls_back_from_challenge_to_next_strategy() {
    let (addr, _) = serve().await;
    let cache = Arc::new(ResultCache::new(Duration::from_secs(60), 8));
    let coordinator = RaceCoordinator::new(cache)
        .with_strategy(
            Box::new(HttpStrategy::new(fast_retry(), ua("TestBot/1.0")).unwrap()),
            0,
            5_000,
        )
        .with_strategy(
            Box::new(StealthHttpStrategy::new(fast_retry(), ua("TestBot/1.0")).unwrap()),
            1,
            5_000,
        );

    let err = coordinator
        .fetch_content(&format!("http://{}/challenge", addr))
        .await
        .unwrap_err();
    match err {
        ScrapeError::AllStrategiesFailed { failures, .. } => {
            assert_eq!(failures.len(), 2);
            assert_eq!(failures[0].strategy, "http");
            assert_eq!(failures[1].strategy, "stealth");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    let ok = coordinator
        .fetch_content(&format!("http://{}/page", addr))
        .await
        .unwrap();
    assert_eq!(ok.title, "Hello Page");
}
