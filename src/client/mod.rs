//! Client subsystem: the symmetric counterpart of the dispatcher.
//!
//! # Data Flow
//! ```text
//! client.get("/items/:id").param("id", 42).query(..).header(..)
//!     → path.rs (template → encoded path, same segment rules as the trie)
//!     → request.rs (headers: content type + x-superjson → config → provider → per call)
//!     → reqwest
//!     → status >= 400 ? ClientError::Status : ResponseBody (Json | Enriched | Binary)
//! ```
//!
//! # Design Decisions
//! - Defaults come from an explicit `ClientConfig`, never globals
//! - Per-call values win over defaults on key conflicts
//! - Bodies are dropped for methods that cannot carry one, as on the server

pub mod error;
pub mod path;
pub mod request;

use futures_util::future::BoxFuture;
use reqwest::header::HeaderMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use url::Url;

use crate::config::ClientConfig;
use crate::routing::Method;

pub use error::ClientError;
pub use request::{RequestBuilder, ResponseBody};

/// Produces headers per call, e.g. a fresh auth token.
pub type HeaderProvider = Arc<dyn Fn() -> BoxFuture<'static, Vec<(String, String)>> + Send + Sync>;

/// HTTP client for a typepath server. Cheap to clone.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    config: Arc<ClientConfig>,
    default_headers: HeaderMap,
    provider: Option<HeaderProvider>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| ClientError::InvalidUrl(format!("{}: {}", config.base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(ClientError::InvalidUrl(config.base_url.clone()));
        }
        let default_headers = request::parse_headers(config.headers.clone())?;

        Ok(Self {
            http: reqwest::Client::new(),
            base_url,
            config: Arc::new(config),
            default_headers,
            provider: None,
        })
    }

    /// Use a preconfigured reqwest client (proxies, TLS, pooling settings).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    /// Add headers computed per call. They override configured headers.
    pub fn with_header_provider<F, Fut>(mut self, provider: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Vec<(String, String)>> + Send + 'static,
    {
        let provider: HeaderProvider =
            Arc::new(move || Box::pin(provider()) as BoxFuture<'static, Vec<(String, String)>>);
        self.provider = Some(provider);
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    pub(crate) fn header_provider(&self) -> Option<&HeaderProvider> {
        self.provider.as_ref()
    }

    /// Start a request for `template` (e.g. `/items/:id`) or a concrete path.
    pub fn request(&self, method: Method, template: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(self.clone(), method, template.into())
    }

    pub fn get(&self, template: impl Into<String>) -> RequestBuilder {
        self.request(Method::Get, template)
    }

    pub fn post(&self, template: impl Into<String>) -> RequestBuilder {
        self.request(Method::Post, template)
    }

    pub fn put(&self, template: impl Into<String>) -> RequestBuilder {
        self.request(Method::Put, template)
    }

    pub fn delete(&self, template: impl Into<String>) -> RequestBuilder {
        self.request(Method::Delete, template)
    }

    pub fn patch(&self, template: impl Into<String>) -> RequestBuilder {
        self.request(Method::Patch, template)
    }

    pub fn options(&self, template: impl Into<String>) -> RequestBuilder {
        self.request(Method::Options, template)
    }

    pub fn head(&self, template: impl Into<String>) -> RequestBuilder {
        self.request(Method::Head, template)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("enriched", &self.config.enriched)
            .field("header_provider", &self.provider.is_some())
            .finish()
    }
}
