//! Per-call request building and response decoding.

use axum::body::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;

use super::error::ClientError;
use super::{path, Client};
use crate::codec::{
    essence, is_enriched, OutgoingBody, RichValue, APPLICATION_JSON, ENRICHED_HEADER, OCTET_STREAM,
};
use crate::routing::Method;

/// A decoded successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// Plain `application/json`.
    Json(Value),
    /// `application/json` tagged `x-superjson: true`.
    Enriched(RichValue),
    /// `application/octet-stream` or any other content type.
    Binary(Bytes),
}

impl ResponseBody {
    /// Decode by content type, preferring the enriched codec when tagged.
    pub fn decode(headers: &HeaderMap, bytes: Bytes) -> Result<Self, ClientError> {
        let content_type = headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(essence);

        match content_type.as_deref() {
            Some(APPLICATION_JSON) if is_enriched(headers) => {
                let text = std::str::from_utf8(&bytes).map_err(|e| ClientError::Decode(e.to_string()))?;
                RichValue::from_enriched_str(text)
                    .map(Self::Enriched)
                    .map_err(|e| ClientError::Decode(e.to_string()))
            }
            Some(APPLICATION_JSON) => serde_json::from_slice(&bytes)
                .map(Self::Json)
                .map_err(|e| ClientError::Decode(e.to_string())),
            _ => Ok(Self::Binary(bytes)),
        }
    }

    /// Deserialize into `T`. Enriched values are flattened to plain JSON first.
    pub fn json<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        match self {
            Self::Json(value) => serde_json::from_value(value).map_err(|e| ClientError::Decode(e.to_string())),
            Self::Enriched(value) => value.deserialize().map_err(|e| ClientError::Decode(e.to_string())),
            Self::Binary(_) => Err(ClientError::Decode("expected JSON, received binary".into())),
        }
    }

    /// The value with dates, sets and maps preserved when the server sent them.
    pub fn into_rich(self) -> Result<RichValue, ClientError> {
        match self {
            Self::Json(value) => Ok(value.into()),
            Self::Enriched(value) => Ok(value),
            Self::Binary(_) => Err(ClientError::Decode("expected JSON, received binary".into())),
        }
    }

    pub fn bytes(&self) -> Option<&Bytes> {
        match self {
            Self::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// A request under construction. Created by [`Client::request`].
#[must_use = "a request does nothing until `send` is awaited"]
pub struct RequestBuilder {
    client: Client,
    method: Method,
    template: String,
    params: BTreeMap<String, String>,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<OutgoingBody>,
    timeout: Option<Duration>,
    error: Option<ClientError>,
}

impl RequestBuilder {
    pub(crate) fn new(client: Client, method: Method, template: String) -> Self {
        Self {
            client,
            method,
            template,
            params: BTreeMap::new(),
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
            timeout: None,
            error: None,
        }
    }

    /// Value for a `:name` or `...name` segment.
    pub fn param(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(name.into(), value.to_string());
        self
    }

    /// Append a query pair.
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Per-call header; wins over configured and provided defaults.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Serialize `body` as `application/json`.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Self {
        match serde_json::to_value(body) {
            Ok(value) => self.body = Some(OutgoingBody::Json(value)),
            Err(e) => self.error = Some(ClientError::Encode(e)),
        }
        self
    }

    /// Send `text/plain`.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.body = Some(OutgoingBody::Text(text.into()));
        self
    }

    /// Send `application/octet-stream`.
    pub fn bytes(mut self, bytes: impl Into<Bytes>) -> Self {
        self.body = Some(OutgoingBody::Binary(bytes.into()));
        self
    }

    /// Send `application/x-www-form-urlencoded`.
    pub fn form<K: AsRef<str>, V: AsRef<str>>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self {
        let encoded = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(pairs)
            .finish();
        self.body = Some(OutgoingBody::Form(encoded));
        self
    }

    /// Send the request and decode the response.
    pub async fn send(self) -> Result<ResponseBody, ClientError> {
        if let Some(err) = self.error {
            return Err(err);
        }

        let url = path::build_url(self.client.base_url(), &self.template, &self.params, &self.query)?;

        let body = if self.method.allows_body() {
            self.body
        } else {
            None
        };

        let mut headers = HeaderMap::new();
        if let Some(body) = &body {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(body.content_type()));
        }
        if self.client.config().enriched {
            headers.insert(ENRICHED_HEADER, HeaderValue::from_static("true"));
        }
        merge(&mut headers, self.client.default_headers().clone());
        if let Some(provider) = self.client.header_provider() {
            merge(&mut headers, parse_headers(provider().await)?);
        }
        merge(&mut headers, parse_headers(self.headers)?);

        tracing::debug!(method = %self.method, url = %url, "Sending request");

        let mut request = self
            .client
            .http()
            .request(self.method.as_http(), url)
            .headers(headers);
        if let Some(timeout) = self.timeout.or_else(|| self.client.config().timeout()) {
            request = request.timeout(timeout);
        }
        if let Some(body) = body {
            request = request.body(body.into_bytes()?);
        }

        let response = request.send().await?;
        let status = response.status();
        let headers = response.headers().clone();

        if status.as_u16() >= 400 {
            let body = response.text().await?;
            tracing::debug!(status = status.as_u16(), "Request failed");
            return Err(ClientError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        ResponseBody::decode(&headers, bytes)
    }

    /// Send and deserialize a JSON (or enriched JSON) response into `T`.
    pub async fn send_json<T: DeserializeOwned>(self) -> Result<T, ClientError> {
        self.send().await?.json()
    }
}

/// Insert `extra` into `headers`, replacing existing values.
fn merge(headers: &mut HeaderMap, extra: HeaderMap) {
    let mut last = None;
    for (name, value) in extra {
        // `None` means "same name as the previous entry".
        if let Some(name) = name {
            headers.remove(&name);
            last = Some(name);
        }
        if let Some(name) = &last {
            headers.append(name.clone(), value);
        }
    }
}

pub(crate) fn parse_headers(pairs: impl IntoIterator<Item = (String, String)>) -> Result<HeaderMap, ClientError> {
    let mut map = HeaderMap::new();
    for (name, value) in pairs {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| ClientError::InvalidHeader(name.clone()))?;
        let value = HeaderValue::from_str(&value).map_err(|_| ClientError::InvalidHeader(name.to_string()))?;
        map.insert(name, value);
    }
    Ok(map)
}
