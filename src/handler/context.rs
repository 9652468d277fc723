//! Per-request handler context.

use axum::http::request::Parts;
use axum::http::Extensions;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::codec::RawBody;
use crate::error::RouteError;

/// Everything a guard or handler can see about the current request.
///
/// The `raw_*` channels are always populated. `params`, `search` and `body`
/// are present only when the route declared a schema for them.
#[derive(Debug, Default)]
pub struct Context {
    /// Captured path segments, exactly as they appeared in the URL.
    pub raw_params: BTreeMap<String, String>,
    /// Query string pairs; the last occurrence of a key wins.
    pub raw_search: BTreeMap<String, String>,
    pub raw_body: RawBody,
    pub params: Option<Value>,
    pub search: Option<Value>,
    pub body: Option<Value>,
    /// Inbound request head. `None` for in-process calls.
    pub request: Option<Parts>,
    extensions: Extensions,
}

impl Context {
    pub fn new(
        raw_params: BTreeMap<String, String>,
        raw_search: BTreeMap<String, String>,
        raw_body: RawBody,
    ) -> Self {
        Self {
            raw_params,
            raw_search,
            raw_body,
            ..Self::default()
        }
    }

    /// Raw captured path parameter.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.raw_params.get(name).map(String::as_str)
    }

    /// Raw query parameter.
    pub fn query(&self, name: &str) -> Option<&str> {
        self.raw_search.get(name).map(String::as_str)
    }

    /// Request header, if dispatched over HTTP.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request
            .as_ref()
            .and_then(|parts| parts.headers.get(name))
            .and_then(|v| v.to_str().ok())
    }

    pub fn params_as<T: DeserializeOwned>(&self) -> Result<T, RouteError> {
        validated(self.params.as_ref(), "params")
    }

    pub fn search_as<T: DeserializeOwned>(&self) -> Result<T, RouteError> {
        validated(self.search.as_ref(), "search")
    }

    pub fn body_as<T: DeserializeOwned>(&self) -> Result<T, RouteError> {
        validated(self.body.as_ref(), "body")
    }

    /// Value injected by a guard or by router context.
    pub fn get<T: Clone + Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions.get::<T>()
    }

    pub fn insert<T: Clone + Send + Sync + 'static>(&mut self, value: T) -> Option<T> {
        self.extensions.insert(value)
    }

    /// Merge values in; entries already present are overwritten.
    pub fn extend(&mut self, extensions: Extensions) {
        self.extensions.extend(extensions);
    }

    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }
}

fn validated<T: DeserializeOwned>(value: Option<&Value>, channel: &str) -> Result<T, RouteError> {
    let value = value.ok_or_else(|| {
        RouteError::fault(format!("route declares no {} schema", channel))
    })?;
    T::deserialize(value).map_err(RouteError::fault)
}
