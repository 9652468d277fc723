//! Calling routes without a network hop.

use serde_json::json;
use typepath::{CallOptions, Method, RichValue, RouteError};

mod common;

#[derive(Clone)]
#[allow(dead_code)]
struct Caller(&'static str);

#[tokio::test]
async fn test_invoke_with_query_and_body() {
    let router = common::router();

    let reply = router
        .invoke(Method::Get, "/search?q=inline&limit=3", CallOptions::new())
        .await
        .unwrap();
    assert_eq!(
        reply.into_value().unwrap().to_plain(),
        json!({"q": "inline", "limit": 3})
    );

    let reply = router
        .invoke(
            Method::Get,
            "/search?limit=3",
            CallOptions::new().query("limit", "4"),
        )
        .await
        .unwrap();
    assert_eq!(reply.into_value().unwrap().to_plain(), json!({"limit": 4}));

    let reply = router
        .invoke(
            Method::Post,
            "/users",
            CallOptions::new().json(json!({"name": "ada"})),
        )
        .await
        .unwrap();
    assert_eq!(reply.into_value().unwrap().to_plain(), json!({"name": "ada"}));
}

#[tokio::test]
async fn test_invoke_errors_match_http() {
    let router = common::router();

    let err = router
        .invoke(Method::Get, "/missing", CallOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RouteError::RouteNotFound { .. }));

    let err = router
        .invoke(Method::Delete, "/users", CallOptions::new())
        .await
        .unwrap_err();
    assert!(matches!(err, RouteError::MethodNotSupported { .. }));

    let err = router
        .invoke(Method::Post, "/users", CallOptions::new().text("ada"))
        .await
        .unwrap_err();
    assert_eq!(err.status_code().as_u16(), 400);
}

#[tokio::test]
async fn test_guard_sees_no_request_head() {
    let router = common::router();

    // Guards reading headers reject in-process calls that carry none.
    let err = router
        .invoke(Method::Get, "/me", CallOptions::new().context(Caller("batch")))
        .await
        .unwrap_err();
    assert_eq!(err.status_code().as_u16(), 401);
}

#[tokio::test]
async fn test_reply_keeps_rich_values() {
    let router = common::router();
    let reply = router
        .invoke(Method::Get, "/time", CallOptions::new())
        .await
        .unwrap();
    assert!(matches!(reply.into_value(), Some(RichValue::Date(_))));
}
