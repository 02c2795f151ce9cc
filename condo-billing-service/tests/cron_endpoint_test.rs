//! HTTP tests for the billing trigger and the request guards.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::{Datelike, Utc};
use common::{date, dec, test_router, MemoryStore, SeededSubscription};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

/// Subscription that is due on any day of the current month.
fn due_today() -> SeededSubscription {
    let today = Utc::now().date_naive();
    SeededSubscription::optional("A 101", dec("100.00"), date(today.year(), today.month(), 1))
}

async fn send(router: axum::Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

fn cron_request(authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri("/api/cron/billing");
    if let Some(value) = authorization {
        builder = builder.header(header::AUTHORIZATION, value);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn run_returns_counts() {
    let store = MemoryStore::new();
    store.seed(due_today());
    store.seed(due_today().required());

    let (status, body) = send(test_router(store.clone(), None), cron_request(None)).await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
        body,
        json!({ "status": "success", "processed": 1, "skipped": 0, "errors": 0 })
    );
    assert_eq!(store.invoices().len(), 1);
}

#[tokio::test]
async fn repeated_trigger_skips_invoiced_period() {
    let store = MemoryStore::new();
    store.seed(due_today());

    send(test_router(store.clone(), None), cron_request(None)).await;
    let (status, body) = send(test_router(store.clone(), None), cron_request(None)).await;

    assert_eq!(status, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["processed"], 0);
    assert_eq!(body["skipped"], 1);
}

#[tokio::test]
async fn listing_failure_returns_500_with_error() {
    let store = MemoryStore::new();
    store.fail_listing();

    let (status, body) = send(test_router(store, None), cron_request(None)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert!(body["error"].as_str().is_some());
}

#[tokio::test]
async fn secret_required_when_configured() {
    let store = MemoryStore::new();
    store.seed(due_today());

    let (missing, _) = send(test_router(store.clone(), Some("s3cret")), cron_request(None)).await;
    let (wrong, _) = send(
        test_router(store.clone(), Some("s3cret")),
        cron_request(Some("Bearer nope")),
    )
    .await;

    assert_eq!(missing, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong, StatusCode::UNAUTHORIZED);
    assert!(store.invoices().is_empty());

    let (ok, body) = send(
        test_router(store.clone(), Some("s3cret")),
        cron_request(Some("Bearer s3cret")),
    )
    .await;

    assert_eq!(ok, StatusCode::OK);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["processed"], 1);
}

#[tokio::test]
async fn admin_endpoints_require_complex_header() {
    let router = test_router(MemoryStore::new(), None);

    let request = Request::builder()
        .uri("/api/units")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(router, request).await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn response_carries_request_id() {
    let router = test_router(MemoryStore::new(), None);

    let response = router
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["x-request-id"], "req-42");
}
