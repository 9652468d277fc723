//! Routing and dispatch through the full middleware stack, in memory.

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

async fn send(method: &str, uri: &str) -> Response {
    common::app()
        .oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn send_json(method: &str, uri: &str, body: Value) -> Response {
    common::app()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_root_route() {
    let response = send("GET", "/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!("root"));
}

#[tokio::test]
async fn test_static_segment_beats_param() {
    let response = send("GET", "/users/me").await;
    assert_eq!(json_body(response).await, json!("static"));

    let response = send("GET", "/users/42").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"id": 42}));
}

#[tokio::test]
async fn test_param_validation_failure() {
    let response = send("GET", "/users/0").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["issues"][0]["path"], "params.id");

    let response = send("GET", "/users/abc").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_catch_all_captures_remainder() {
    let response = send("GET", "/files/docs/2024/report.pdf").await;
    assert_eq!(json_body(response).await, json!("docs/2024/report.pdf"));

    let response = send("GET", "/files/one").await;
    assert_eq!(json_body(response).await, json!("one"));

    // The catch-all needs at least one segment.
    let response = send("GET", "/files").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_not_found() {
    let response = send("GET", "/nope/at/all").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_method_not_allowed_lists_methods() {
    let response = send("GET", "/users").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "POST");

    let response = send("PATCH", "/users/7").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(response.headers()[header::ALLOW], "GET, PUT");
}

#[tokio::test]
async fn test_unknown_method() {
    let response = send("PROPFIND", "/").await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_same_template_per_method() {
    let response = send_json("PUT", "/users/7", json!({"name": "ada"})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({"id": "7", "body": {"name": "ada"}})
    );
}

#[tokio::test]
async fn test_body_validation() {
    let response = send_json("POST", "/users", json!({"name": "ada", "age": 36})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"name": "ada", "age": 36}));

    let response = send_json("POST", "/users", json!({"name": ""})).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["issues"][0]["path"], "body.name");

    let response = send("POST", "/users").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["issues"][0]["path"], "body");
}

#[tokio::test]
async fn test_malformed_json_body() {
    let response = common::app()
        .oneshot(
            Request::post("/users")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{\"name\":"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_defaults_and_coercion() {
    let response = send("GET", "/search?q=rust").await;
    assert_eq!(json_body(response).await, json!({"q": "rust", "limit": 10}));

    let response = send("GET", "/search?limit=25").await;
    assert_eq!(json_body(response).await, json!({"limit": 25}));

    let response = send("GET", "/search?limit=500").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["issues"][0]["path"], "search.limit");
}

#[tokio::test]
async fn test_guard_rejects_and_injects() {
    let response = send("GET", "/me").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = common::app()
        .oneshot(
            Request::get("/me")
                .header(header::AUTHORIZATION, "Bearer grace")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!("grace"));
}

#[tokio::test]
async fn test_handler_errors() {
    let response = send("DELETE", "/fail").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert!(!String::from_utf8_lossy(&bytes).contains("database"));

    let response = send("GET", "/teapot").await;
    assert_eq!(response.status().as_u16(), 418);
}

#[tokio::test]
async fn test_enriched_reply_is_negotiated() {
    let response = send("GET", "/time").await;
    assert!(response.headers().get("x-superjson").is_none());
    assert_eq!(json_body(response).await, json!("2024-05-01T12:00:00.000Z"));

    let response = common::app()
        .oneshot(
            Request::get("/time")
                .header("x-superjson", "true")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-superjson"], "true");
    assert_eq!(
        json_body(response).await,
        json!({"json": "2024-05-01T12:00:00.000Z", "meta": {"values": ["Date"]}})
    );
}
