//! Contact API Tests
//!
//! End-to-end requests through the full router:
//! - Submission, lookup, listing and deletion
//! - Validation and error bodies
//! - Admission gate on submissions only
//! - Notification failures never reach the client

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::Router;
use contactd::config::RateLimitConfig;
use contactd::http_server::{AppServices, HttpServer, HttpServerConfig};
use contactd::notify::{MemoryNotifier, SharedNotifier};
use contactd::observability::MetricsRegistry;
use contactd::storage::ContactStore;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

// =============================================================================
// Test Utilities
// =============================================================================

struct TestApp {
    router: Router,
    store: ContactStore,
    metrics: Arc<MetricsRegistry>,
    _dir: TempDir,
}

fn create_app(notifier: SharedNotifier, max_requests: u32) -> TestApp {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = ContactStore::open(&dir.path().join("contacts.db")).unwrap();
    let metrics = Arc::new(MetricsRegistry::new());

    let services = AppServices {
        store: store.clone(),
        notifier,
        metrics: Arc::clone(&metrics),
        rate_limit: RateLimitConfig {
            window_ms: 60_000,
            max_requests,
        },
    };

    TestApp {
        router: HttpServer::new(HttpServerConfig::default(), services).router(),
        store,
        metrics,
        _dir: dir,
    }
}

fn default_app() -> TestApp {
    create_app(Arc::new(MemoryNotifier::new()), 100)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn empty_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn john_doe() -> Value {
    json!({
        "name": "John Doe",
        "email": "JOHN@Example.com ",
        "message": "Hello, I want info."
    })
}

// =============================================================================
// Submission
// =============================================================================

#[tokio::test]
async fn test_submission_is_normalized_and_stored() {
    let app = default_app();

    let (status, body) = send(&app, json_request("POST", "/api/contacts", john_doe())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(
        body["message"],
        "Your message has been received. We will get back to you soon!"
    );
    assert_eq!(body["data"]["name"], "John Doe");
    assert_eq!(body["data"]["email"], "john@example.com");
    assert_eq!(body["data"]["message"], "Hello, I want info.");

    let id = body["data"]["id"].as_i64().unwrap();
    let stored = app.store.find_by_id(id).await.unwrap().unwrap();
    assert_eq!(stored.email, "john@example.com");
}

#[tokio::test]
async fn test_all_violations_are_reported_together() {
    let app = default_app();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/contacts",
            json!({"name": "a", "email": "bad", "message": "short"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("Name is required and must be at least 2 characters."));
    assert!(error.contains("A valid email address is required."));
    assert!(error.contains("Message is required and must be at least 10 characters."));
    assert_eq!(app.store.count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_form_encoded_submission_is_accepted() {
    let app = default_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/contacts")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(
            "name=John+Doe&email=john%40example.com&message=Hello%2C+I+want+info.",
        ))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "John Doe");
    assert_eq!(body["data"]["email"], "john@example.com");
    assert_eq!(body["data"]["message"], "Hello, I want info.");
    assert_eq!(app.store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = default_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/contacts")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let app = default_app();

    let request = json_request(
        "POST",
        "/api/contacts",
        json!({"name": "John", "email": "j@example.com", "message": "x".repeat(20 * 1024)}),
    );
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["success"], false);
}

// =============================================================================
// Notification Isolation
// =============================================================================

#[tokio::test]
async fn test_failing_notifier_still_returns_created() {
    let app = create_app(Arc::new(MemoryNotifier::failing("SMTP unreachable")), 100);

    let (status, body) = send(&app, json_request("POST", "/api/contacts", john_doe())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(app.store.count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_notifier_receives_normalized_contact() {
    let notifier = Arc::new(MemoryNotifier::new());
    let app = create_app(notifier.clone(), 100);

    let (status, _) = send(&app, json_request("POST", "/api/contacts", john_doe())).await;
    assert_eq!(status, StatusCode::CREATED);

    // Delivery is detached from the response; give it a moment.
    for _ in 0..100 {
        if notifier.sent_count() > 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].email, "john@example.com");
}

// =============================================================================
// Query / Delete
// =============================================================================

#[tokio::test]
async fn test_list_is_paginated_newest_first() {
    let app = default_app();
    for n in 0..3 {
        let body = json!({
            "name": format!("Sender {}", n),
            "email": format!("s{}@example.com", n),
            "message": "A perfectly fine message."
        });
        send(&app, json_request("POST", "/api/contacts", body)).await;
    }

    let (status, body) = send(&app, empty_request("GET", "/api/contacts?page=1&limit=2")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
    assert_eq!(body["data"][0]["name"], "Sender 2");
    assert_eq!(
        body["pagination"],
        json!({"page": 1, "limit": 2, "total": 3, "totalPages": 2})
    );
}

#[tokio::test]
async fn test_invalid_query_values_fall_back_to_defaults() {
    let app = default_app();

    let (status, body) = send(&app, empty_request("GET", "/api/contacts?page=abc&limit=500")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 100);
}

#[tokio::test]
async fn test_repeated_query_key_falls_back_to_defaults() {
    let app = default_app();

    let (status, body) = send(&app, empty_request("GET", "/api/contacts?page=1&page=2")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["pagination"]["page"], 1);
    assert_eq!(body["pagination"]["limit"], 20);
}

#[tokio::test]
async fn test_oversized_page_number_yields_empty_page() {
    let app = default_app();
    send(&app, json_request("POST", "/api/contacts", john_doe())).await;

    let (status, body) = send(
        &app,
        empty_request("GET", "/api/contacts?page=99999999999999999999&limit=10"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
    assert_eq!(body["pagination"]["page"], u64::from(u32::MAX));
    assert_eq!(body["pagination"]["total"], 1);
}

#[tokio::test]
async fn test_get_and_delete_by_id() {
    let app = default_app();
    let (_, created) = send(&app, json_request("POST", "/api/contacts", john_doe())).await;
    let uri = format!("/api/contacts/{}", created["data"]["id"]);

    let (status, body) = send(&app, empty_request("GET", &uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], created["data"]);

    let (status, body) = send(&app, empty_request("DELETE", &uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"success": true, "message": "Contact deleted successfully."})
    );

    let (status, body) = send(&app, empty_request("DELETE", &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "error": "Contact not found."}));

    let (status, _) = send(&app, empty_request("GET", &uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_id_is_not_found() {
    let app = default_app();

    let (status, body) = send(&app, empty_request("GET", "/api/contacts/not-a-number")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Contact not found.");
}

// =============================================================================
// Admission Gate
// =============================================================================

#[tokio::test]
async fn test_submissions_over_limit_are_rejected() {
    let app = create_app(Arc::new(MemoryNotifier::new()), 2);

    for _ in 0..2 {
        let (status, _) = send(&app, json_request("POST", "/api/contacts", john_doe())).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, body) = send(&app, json_request("POST", "/api/contacts", john_doe())).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(
        body,
        json!({"success": false, "error": "Too many submissions. Please try again later."})
    );
    assert_eq!(app.store.count().await.unwrap(), 2);
    assert_eq!(app.metrics.snapshot().admission_rejections, 1);

    // Reads are not gated.
    let (status, _) = send(&app, empty_request("GET", "/api/contacts")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_gate_runs_before_validation() {
    let app = create_app(Arc::new(MemoryNotifier::new()), 1);

    let bad = json!({"name": "a"});
    let (status, _) = send(&app, json_request("POST", "/api/contacts", bad.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, json_request("POST", "/api/contacts", bad)).await;
    assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_rate_limit_headers_are_set() {
    let app = create_app(Arc::new(MemoryNotifier::new()), 5);

    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/api/contacts", john_doe()))
        .await
        .unwrap();

    let headers = response.headers();
    assert_eq!(headers["ratelimit-limit"], "5");
    assert_eq!(headers["ratelimit-remaining"], "4");
    assert!(headers.contains_key("ratelimit-reset"));
}

// =============================================================================
// Service Routes
// =============================================================================

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = default_app();

    let (status, body) = send(&app, empty_request("GET", "/api/nope")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "error": "Route not found."}));
}

#[tokio::test]
async fn test_unsupported_method_is_json_404() {
    let app = default_app();

    let (status, body) = send(&app, empty_request("PUT", "/api/contacts/1")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "error": "Route not found."}));

    let (status, body) = send(&app, empty_request("PATCH", "/api/contacts")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"success": false, "error": "Route not found."}));
}

#[tokio::test]
async fn test_health_reports_ok() {
    let app = default_app();

    let (status, body) = send(&app, empty_request("GET", "/api/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn test_metrics_reflect_activity() {
    let app = default_app();
    send(&app, json_request("POST", "/api/contacts", john_doe())).await;
    send(&app, json_request("POST", "/api/contacts", json!({}))).await;

    let (status, body) = send(&app, empty_request("GET", "/api/metrics")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["contacts_created"], 1);
    assert_eq!(body["validation_failures"], 1);
}

#[tokio::test]
async fn test_security_headers_are_present() {
    let app = default_app();

    let response = app
        .router
        .clone()
        .oneshot(empty_request("GET", "/api/health"))
        .await
        .unwrap();

    assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    assert_eq!(response.headers()["x-frame-options"], "SAMEORIGIN");
}

// =============================================================================
// Internal Errors
// =============================================================================

#[tokio::test]
async fn test_storage_failure_hides_detail() {
    let app = default_app();
    app.store.close().unwrap();

    let (status, body) = send(&app, json_request("POST", "/api/contacts", john_doe())).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, json!({"success": false, "error": "Internal server error"}));
    assert_eq!(app.metrics.snapshot().internal_errors, 1);
}
