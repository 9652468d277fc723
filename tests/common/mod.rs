//! Shared utilities for integration tests.

use std::sync::Arc;

use axum::Router as AxumRouter;
use serde_json::json;
use typepath::schema::{fields, number, string, SchemaExt};
use typepath::{
    delete, get, inject, listen, post, put, status, Client, ClientConfig, Context, Guard,
    HttpServer, Json, RouteError, RouteTable, Router, ServerConfig, ServerHandle,
};

#[derive(Clone)]
#[allow(dead_code)]
pub struct User {
    pub name: String,
}

/// Rejects requests without `authorization: Bearer <name>` and injects the user.
pub fn bearer_guard() -> Guard {
    Guard::new(|ctx: &Context| {
        let token = ctx
            .header("authorization")
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| status(401, "Unauthorized"))?;
        Ok(inject(User {
            name: token.to_string(),
        }))
    })
}

/// A route table touching every routing feature.
pub fn routes() -> RouteTable {
    RouteTable::new()
        .route(
            "/",
            get(|_ctx: Context| async { Ok::<_, RouteError>("root") }),
        )
        .route(
            "/users/me",
            get(|_ctx: Context| async { Ok::<_, RouteError>("static") }),
        )
        .routes(
            "/users/:id",
            [
                get(|ctx: Context| async move { Ok::<_, RouteError>(Json(ctx.params)) })
                .params(fields().field("id", number().coerce().integer().min(1.0))),
                put(|ctx: Context| async move {
                    Ok::<_, RouteError>(Json(json!({ "id": ctx.param("id"), "body": ctx.body })))
                })
                .body(fields().field("name", string())),
            ],
        )
        .route(
            "/users",
            post(|ctx: Context| async move { Ok::<_, RouteError>(Json(ctx.body.clone())) })
                .body(
                    fields()
                        .field("name", string().min(1))
                        .field("age", number().integer().optional()),
                ),
        )
        .route(
            "/search",
            get(|ctx: Context| async move { Ok::<_, RouteError>(Json(ctx.search.clone())) }).search(
                fields()
                    .field("q", string().optional())
                    .field("limit", number().coerce().integer().min(1.0).max(100.0).default(10)),
            ),
        )
        .route(
            "/files/...path",
            get(|ctx: Context| async move {
                Ok::<_, RouteError>(ctx.param("path").unwrap_or_default().to_string())
            }),
        )
        .route(
            "/me",
            get(|ctx: Context| async move {
                let user = ctx.get::<User>().ok_or_else(|| status(401, "Unauthorized"))?;
                Ok::<_, RouteError>(user.name.clone())
            })
            .guard(bearer_guard()),
        )
        .route(
            "/blob",
            post(|ctx: Context| async move {
                let bytes = ctx.raw_body.as_bytes().cloned().unwrap_or_default();
                Ok::<_, RouteError>(bytes.to_vec())
            }),
        )
        .route(
            "/time",
            get(|_ctx: Context| async {
                let at = chrono::DateTime::parse_from_rfc3339("2024-05-01T12:00:00Z")
                    .map_err(RouteError::fault)?
                    .with_timezone(&chrono::Utc);
                Ok::<_, RouteError>(at)
            }),
        )
        .route(
            "/echo-headers",
            get(|ctx: Context| async move {
                Ok::<_, RouteError>(Json(json!({
                    "x-tenant": ctx.header("x-tenant"),
                    "x-trace": ctx.header("x-trace"),
                })))
            }),
        )
        .route(
            "/fail",
            delete(|_ctx: Context| async { Err::<(), _>(RouteError::fault("database offline")) }),
        )
        .route(
            "/teapot",
            get(|_ctx: Context| async { Err::<(), _>(status(418, "short and stout")) }),
        )
}

pub fn router() -> Arc<Router> {
    Arc::new(Router::new(routes()).unwrap())
}

/// In-memory app for `tower::ServiceExt::oneshot` tests.
#[allow(dead_code)]
pub fn app() -> AxumRouter {
    HttpServer::new(router(), ServerConfig::default()).into_router()
}

/// Serve the shared route table on an ephemeral local port.
#[allow(dead_code)]
pub async fn start_server() -> ServerHandle {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    listen(router(), config).await.unwrap()
}

/// Crate client pointed at a running server.
#[allow(dead_code)]
pub fn client_for(handle: &ServerHandle) -> Client {
    Client::new(ClientConfig::new(format!("http://{}", handle.local_addr()))).unwrap()
}
