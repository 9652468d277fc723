//! Request dispatch: from a matched route to a serialized reply.
//!
//! # Responsibilities
//! - Resolve the route for an inbound request
//! - Decode the body by content type and parse the query string
//! - Validate body, params and search against the declared schemas
//! - Build the handler context and run the guarded handler
//! - Serialize the reply, or translate the error into a response
//!
//! # Design Decisions
//! - One pipeline for HTTP and in-process calls (`Router::invoke`)
//! - Linear, no retries: the first failure completes the request
//! - Handler faults are logged here and collapsed to a generic 500

use axum::body::Body;
use axum::http::request::Parts;
use axum::http::{header, Extensions, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use crate::codec::{is_enriched, RawBody};
use crate::error::RouteError;
use crate::handler::{Context, Reply};
use crate::http::request::request_id;
use crate::observability::metrics;
use crate::routing::{Match, Method, Router};
use crate::schema::ValidationError;

/// Message for a declared body schema without a JSON body.
pub const BODY_REQUIRED: &str = "Body required (application/json)";

/// Inputs for an in-process call.
#[derive(Debug, Default)]
pub struct CallOptions {
    pub body: RawBody,
    /// Query values; these win over any in the call path.
    pub search: BTreeMap<String, String>,
    /// Extra values for this call only, on top of the router context.
    pub context: Extensions,
}

impl CallOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(mut self, body: impl Into<RawBody>) -> Self {
        self.body = body.into();
        self
    }

    /// Send a JSON body.
    pub fn json(self, value: serde_json::Value) -> Self {
        self.body(RawBody::Json(value))
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.body(RawBody::Text(text.into()))
    }

    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.search.insert(key.into(), value.into());
        self
    }

    pub fn context<T: Clone + Send + Sync + 'static>(mut self, value: T) -> Self {
        self.context.insert(value);
        self
    }
}

/// Parse a query string into a map; the last occurrence of a key wins.
pub fn parse_query(query: Option<&str>) -> BTreeMap<String, String> {
    query
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// Validate the declared channels, build the context and run the handler.
pub(crate) async fn execute(
    router: &Router,
    found: Match<'_>,
    raw_search: BTreeMap<String, String>,
    raw_body: RawBody,
    request: Option<Parts>,
    call_context: Extensions,
) -> Result<Reply, RouteError> {
    let endpoint = found.endpoint;
    let parsers = &endpoint.parsers;

    let body = match &parsers.body {
        Some(schema) => match &raw_body {
            RawBody::Json(value) => Some(schema.parse(value).map_err(|e| e.prefixed("body"))?),
            _ => return Err(ValidationError::message(BODY_REQUIRED).prefixed("body").into()),
        },
        None => None,
    };

    let params = match &parsers.params {
        Some(fields) => Some(fields.parse_map(&found.params).map_err(|e| e.prefixed("params"))?),
        None => None,
    };

    let search = match &parsers.search {
        Some(fields) => Some(fields.parse_map(&raw_search).map_err(|e| e.prefixed("search"))?),
        None => None,
    };

    let mut ctx = Context::new(found.params, raw_search, raw_body);
    ctx.body = body;
    ctx.params = params;
    ctx.search = search;
    ctx.request = request;
    ctx.extend(router.context().clone());
    ctx.extend(call_context);

    endpoint.handler.call(ctx).await
}

impl Router {
    /// Call a route in-process, without HTTP.
    ///
    /// `path` may carry a query string. A body given for GET, HEAD or OPTIONS is dropped.
    pub async fn invoke(
        &self,
        method: Method,
        path: &str,
        options: CallOptions,
    ) -> Result<Reply, RouteError> {
        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path, None),
        };

        let found = self.lookup(method.as_str(), path)?;

        let mut raw_search = parse_query(query);
        raw_search.extend(options.search);

        let raw_body = if method.allows_body() {
            options.body
        } else {
            RawBody::Empty
        };

        execute(self, found, raw_search, raw_body, None, options.context).await
    }
}

/// Turns HTTP requests into handler calls.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    router: Arc<Router>,
    max_body_bytes: usize,
}

impl Dispatcher {
    pub fn new(router: Arc<Router>, max_body_bytes: usize) -> Self {
        Self {
            router,
            max_body_bytes,
        }
    }

    pub fn router(&self) -> &Arc<Router> {
        &self.router
    }

    /// Handle one request end to end. Never fails: errors become responses.
    pub async fn handle(&self, request: Request<Body>) -> Response {
        let start = Instant::now();
        let request_id = request_id(request.headers()).to_string();
        let method = request.method().clone();
        let path = request.uri().path().to_string();
        let enriched = is_enriched(request.headers());

        tracing::debug!(
            request_id = %request_id,
            method = %method,
            path = %path,
            "Dispatching request"
        );

        let (route, result) = self.dispatch(request).await;

        let response = match result {
            Ok(reply) => reply.into_response(enriched),
            Err(err) => {
                match &err {
                    RouteError::HandlerFault(message) => {
                        tracing::error!(request_id = %request_id, path = %path, error = %message, "Handler fault");
                    }
                    RouteError::RouteNotFound { .. } | RouteError::MethodNotSupported { .. } => {
                        tracing::warn!(request_id = %request_id, method = %method, path = %path, "No route matched");
                    }
                    other => {
                        tracing::debug!(request_id = %request_id, path = %path, error = %other, "Request rejected");
                    }
                }
                err.into_response()
            }
        };

        let status = response.status();
        metrics::record_request(method.as_str(), status.as_u16(), &route, start);
        tracing::debug!(
            request_id = %request_id,
            route = %route,
            status = status.as_u16(),
            "Request complete"
        );
        response
    }

    async fn dispatch(&self, request: Request<Body>) -> (String, Result<Reply, RouteError>) {
        let (parts, body) = request.into_parts();

        let found = match self.router.lookup(parts.method.as_str(), parts.uri.path()) {
            Ok(found) => found,
            Err(err) => return ("none".to_string(), Err(err)),
        };
        let route = found.matched_path().to_string();

        let raw_search = parse_query(parts.uri.query());

        let carries_body = Method::from_http(&parts.method).is_some_and(|m| m.allows_body());
        let raw_body = if carries_body {
            let bytes = match axum::body::to_bytes(body, self.max_body_bytes).await {
                Ok(bytes) => bytes,
                Err(_) => {
                    let err = RouteError::Rejected {
                        status: StatusCode::PAYLOAD_TOO_LARGE,
                        message: "Payload too large".to_string(),
                    };
                    return (route, Err(err));
                }
            };
            let content_type = parts
                .headers
                .get(header::CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            match RawBody::decode(content_type, bytes) {
                Ok(raw) => raw,
                Err(err) => return (route, Err(err.prefixed("body").into())),
            }
        } else {
            RawBody::Empty
        };

        let result = execute(
            &self.router,
            found,
            raw_search,
            raw_body,
            Some(parts),
            Extensions::new(),
        )
        .await;
        (route, result)
    }
}

/// axum fallback handler.
pub(crate) async fn dispatch_handler(
    axum::extract::State(dispatcher): axum::extract::State<Dispatcher>,
    request: Request<Body>,
) -> Response {
    dispatcher.handle(request).await
}
